use crate::api::{ConversationDto, FriendDto, MessageDto, Page};
use crate::state::{AppState, Friend, MessageId};

#[derive(Debug, Clone)]
pub enum AppUpdate {
    /// Primary update stream: always a full state snapshot.
    ///
    /// MVP tradeoff: the simplest reconciliation story for embedders; can be
    /// made more granular later.
    FullState(AppState),
}

impl AppUpdate {
    pub fn rev(&self) -> u64 {
        match self {
            AppUpdate::FullState(s) => s.rev,
        }
    }
}

#[derive(Debug)]
pub enum CoreMsg {
    Action(crate::actions::AppAction),
    Internal(Box<InternalEvent>),
    /// Stops the actor loop; in-flight request results are discarded.
    Shutdown,
}

/// What a conversation-create call was trying to build, so the seeding logic
/// can fall back to locally-known identity when the response is sparse.
#[derive(Debug, Clone)]
pub enum CreateOrigin {
    Direct { friend: Friend },
    Group { name: String },
}

#[derive(Debug)]
pub enum InternalEvent {
    /// Scheduled or follow-up reconciliation trigger.
    PollTick,

    // Fetch-cycle results
    CycleFetched {
        headers: Vec<ConversationDto>,
        all: Page<MessageDto>,
        unread: Vec<MessageDto>,
    },
    CycleFailed {
        error: String,
    },

    // Roster results
    FriendsFetched {
        friends: Vec<FriendDto>,
    },
    FriendsFailed {
        error: String,
    },
    ConversationCreated {
        conversation: ConversationDto,
        origin: CreateOrigin,
    },
    CreateConversationFailed {
        error: String,
    },

    // Send pipeline result
    SendMessageResult {
        conversation_id: u64,
        local_id: MessageId,
        server_id: Option<u64>,
        ok: bool,
        error: Option<String>,
    },

    // Read receipts
    MarkedRead {
        conversation_id: u64,
        message_ids: Vec<MessageId>,
    },
    MarkReadFailed {
        conversation_id: u64,
        error: String,
    },
}
