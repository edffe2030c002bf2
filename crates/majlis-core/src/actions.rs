use crate::state::MessageId;

#[derive(Debug, Clone)]
pub enum AppAction {
    /// Trigger a reconciliation cycle outside the regular poll cadence.
    Refresh,

    // Selection
    SelectConversation { conversation_id: u64 },
    ClearSelection,

    // Composer
    SetDraft { text: String },
    SetReplyTarget { message_id: MessageId },
    ClearReplyTarget,
    /// Attachment payload already converted to base64 by the embedder.
    SetAttachment { data_base64: String },
    ClearAttachment,
    SendMessage { content: String },

    // Roster
    LoadFriends,
    StartChat { friend_id: u64 },
    CreateGroup {
        name: String,
        participant_ids: Vec<u64>,
        picture_base64: Option<String>,
    },

    // Views
    SetConversationFilter { term: String },
    SetFriendFilter { term: String },
    SetPage { page: u32 },

    // UI
    ClearError,
}

impl AppAction {
    /// Log-safe action tag (never includes message content or payloads).
    pub fn tag(&self) -> &'static str {
        match self {
            AppAction::Refresh => "Refresh",
            AppAction::SelectConversation { .. } => "SelectConversation",
            AppAction::ClearSelection => "ClearSelection",
            AppAction::SetDraft { .. } => "SetDraft",
            AppAction::SetReplyTarget { .. } => "SetReplyTarget",
            AppAction::ClearReplyTarget => "ClearReplyTarget",
            AppAction::SetAttachment { .. } => "SetAttachment",
            AppAction::ClearAttachment => "ClearAttachment",
            AppAction::SendMessage { .. } => "SendMessage",
            AppAction::LoadFriends => "LoadFriends",
            AppAction::StartChat { .. } => "StartChat",
            AppAction::CreateGroup { .. } => "CreateGroup",
            AppAction::SetConversationFilter { .. } => "SetConversationFilter",
            AppAction::SetFriendFilter { .. } => "SetFriendFilter",
            AppAction::SetPage { .. } => "SetPage",
            AppAction::ClearError => "ClearError",
        }
    }
}
