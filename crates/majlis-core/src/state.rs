use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display name used when a message arrives without sender information.
pub const UNKNOWN_SENDER: &str = "Unknown";
/// Display title for a conversation nobody could name.
pub const UNKNOWN_TITLE: &str = "Unknown";
/// Display title for a group conversation without a server title.
pub const UNNAMED_GROUP: &str = "Unnamed group";
/// Content stand-in for a message that carries only an attachment.
pub const ATTACHMENT_PLACEHOLDER: &str = "Photo";

/// Message identity. Server ids are stable and used for deduplication across
/// poll cycles; local ids are synthetic placeholders (records the server
/// returned without an id, or optimistic sends awaiting the server echo) and
/// are unique but never stable across polls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Server(u64),
    Local(String),
}

impl MessageId {
    pub fn new_local() -> Self {
        MessageId::Local(uuid::Uuid::new_v4().to_string())
    }

    pub fn server_id(&self) -> Option<u64> {
        match self {
            MessageId::Server(id) => Some(*id),
            MessageId::Local(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Normal,
    System,
}

/// Delivery status of a message as this client knows it. Fetched messages
/// are always `Sent`; locally-sent messages start `Pending` and are marked
/// `Sent` or `Failed` when the request resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryState {
    Sent,
    Pending,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub conversation_id: u64,
    pub content: String,
    pub sender_id: Option<u64>,
    pub sender_display_name: String,
    pub sender_avatar_url: String,
    pub sent_at: DateTime<Utc>,
    pub kind: MessageKind,
    pub reply_to_message_id: Option<u64>,
    pub is_read: bool,
    /// Base64 payload, already in wire form.
    pub attachment: Option<String>,
    pub delivery: DeliveryState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: u64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl Participant {
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref().filter(|l| !l.is_empty()) {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

/// Candidate chat partner from the followed-users list. Fetched on demand,
/// never persisted across poll cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    pub id: u64,
    pub user_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: u64,
    /// Server-assigned title; sticky once known, never downgraded to None.
    pub canonical_title: Option<String>,
    /// Resolved title shown in lists and headers.
    pub display_title: String,
    pub participants: Vec<Participant>,
    pub is_group: bool,
    /// Sticky avatar source URL; None until any cycle supplies one.
    pub avatar_url: Option<String>,
    /// Resolved avatar, falling back to the configured default asset.
    pub display_avatar_url: String,
    /// Ascending by `sent_at` at all times.
    pub messages: Vec<ChatMessage>,
    /// Maximum-`sent_at` message merged so far; never regresses.
    pub last_message: Option<ChatMessage>,
    pub unread_count: u32,
}

impl Conversation {
    pub fn contains_message(&self, id: &MessageId) -> bool {
        self.messages.iter().any(|m| &m.id == id)
    }

    pub fn has_participant(&self, user_id: u64) -> bool {
        self.participants.iter().any(|p| p.id == user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BusyState {
    pub sending: bool,
    pub creating_chat: bool,
}

impl BusyState {
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Full engine state. Snapshots of this struct are what the update stream
/// carries; all mutation happens inside the core actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub rev: u64,
    /// Newest-first by `last_message.sent_at`; conversations without a
    /// message sort last in stable order.
    pub conversations: Vec<Conversation>,
    pub selected_conversation_id: Option<u64>,
    /// Derived copy of the selected conversation, refreshed by every writer.
    pub current_conversation: Option<Conversation>,
    pub friends: Vec<Friend>,
    pub draft: String,
    pub reply_target: Option<ChatMessage>,
    /// Base64 payload handed over by the embedder, awaiting the next send.
    pub pending_attachment: Option<String>,
    pub busy: BusyState,
    pub page: u32,
    pub total_pages: u32,
    pub last_error: Option<String>,
    pub friends_error: Option<String>,
    pub conversation_filter: String,
    pub friend_filter: String,
}

impl AppState {
    pub fn empty() -> Self {
        Self {
            rev: 0,
            conversations: vec![],
            selected_conversation_id: None,
            current_conversation: None,
            friends: vec![],
            draft: String::new(),
            reply_target: None,
            pending_attachment: None,
            busy: BusyState::idle(),
            page: 1,
            total_pages: 1,
            last_error: None,
            friends_error: None,
            conversation_filter: String::new(),
            friend_filter: String::new(),
        }
    }

    pub fn conversation(&self, id: u64) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn selected_conversation(&self) -> Option<&Conversation> {
        self.selected_conversation_id.and_then(|id| self.conversation(id))
    }

    /// Conversations whose display title or any participant name matches the
    /// current filter, case-insensitively. Empty filter returns everything.
    pub fn filtered_conversations(&self) -> Vec<&Conversation> {
        let needle = self.conversation_filter.trim().to_lowercase();
        if needle.is_empty() {
            return self.conversations.iter().collect();
        }
        self.conversations
            .iter()
            .filter(|c| {
                c.display_title.to_lowercase().contains(&needle)
                    || c.participants.iter().any(|p| {
                        p.first_name.to_lowercase().contains(&needle)
                            || p.last_name
                                .as_deref()
                                .is_some_and(|l| l.to_lowercase().contains(&needle))
                    })
            })
            .collect()
    }

    /// Friends whose user name matches the current filter, case-insensitively.
    pub fn filtered_friends(&self) -> Vec<&Friend> {
        let needle = self.friend_filter.trim().to_lowercase();
        if needle.is_empty() {
            return self.friends.iter().collect();
        }
        self.friends
            .iter()
            .filter(|f| f.user_name.to_lowercase().contains(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(id: u64, title: &str, participants: Vec<Participant>) -> Conversation {
        Conversation {
            id,
            canonical_title: Some(title.to_string()),
            display_title: title.to_string(),
            participants,
            is_group: false,
            avatar_url: None,
            display_avatar_url: String::new(),
            messages: vec![],
            last_message: None,
            unread_count: 0,
        }
    }

    fn participant(id: u64, first: &str, last: Option<&str>) -> Participant {
        Participant {
            id,
            first_name: first.to_string(),
            last_name: last.map(str::to_string),
            avatar_url: None,
        }
    }

    #[test]
    fn conversation_filter_matches_title_case_insensitively() {
        let mut state = AppState::empty();
        state.conversations = vec![
            conv(1, "Weekend plans", vec![]),
            conv(2, "Work", vec![]),
        ];
        state.conversation_filter = "weekend".to_string();
        let hits = state.filtered_conversations();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn conversation_filter_matches_participant_names() {
        let mut state = AppState::empty();
        state.conversations = vec![
            conv(1, "Chat A", vec![participant(7, "Layla", Some("Hassan"))]),
            conv(2, "Chat B", vec![participant(8, "Omar", None)]),
        ];
        state.conversation_filter = "hassan".to_string();
        assert_eq!(state.filtered_conversations()[0].id, 1);

        state.conversation_filter = "OMAR".to_string();
        assert_eq!(state.filtered_conversations()[0].id, 2);
    }

    #[test]
    fn empty_filter_returns_all_conversations() {
        let mut state = AppState::empty();
        state.conversations = vec![conv(1, "A", vec![]), conv(2, "B", vec![])];
        state.conversation_filter = "   ".to_string();
        assert_eq!(state.filtered_conversations().len(), 2);
    }

    #[test]
    fn friend_filter_matches_user_name() {
        let mut state = AppState::empty();
        state.friends = vec![
            Friend {
                id: 1,
                user_name: "karim_crafts".to_string(),
                avatar_url: None,
            },
            Friend {
                id: 2,
                user_name: "nour".to_string(),
                avatar_url: None,
            },
        ];
        state.friend_filter = "KARIM".to_string();
        let hits = state.filtered_friends();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn participant_full_name_skips_empty_last_name() {
        assert_eq!(participant(1, "Sara", Some("Amin")).full_name(), "Sara Amin");
        assert_eq!(participant(1, "Sara", None).full_name(), "Sara");
        let mut p = participant(1, "Sara", Some(""));
        p.last_name = Some(String::new());
        assert_eq!(p.full_name(), "Sara");
    }

    #[test]
    fn local_ids_are_unique() {
        assert_ne!(MessageId::new_local(), MessageId::new_local());
    }
}
