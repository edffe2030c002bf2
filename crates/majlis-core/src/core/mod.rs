//! The app actor: owns all mutable state, processes actions and internal
//! events from a single inbox, and emits a full snapshot after every
//! transition.

mod normalize;
mod poll;
mod reconcile;
mod roster;
mod send;

use std::sync::{Arc, RwLock};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use flume::Sender;

use crate::actions::AppAction;
use crate::api::{
    ApiError, ChatApi, ConversationDto, CreateConversationRequest, FriendDto, MessageDto, Page,
    SendMessageRequest,
};
use crate::config::ClientConfig;
use crate::state::{
    AppState, ChatMessage, Conversation, DeliveryState, MessageId, MessageKind, Participant,
    ATTACHMENT_PLACEHOLDER,
};
use crate::updates::{AppUpdate, CoreMsg, CreateOrigin, InternalEvent};

use normalize::{normalize_friends, normalize_message, Feed};
use reconcile::{
    header_map, normalize_header, overlay_unread, reconcile_cycle, resolve_presentation,
    sort_conversations,
};

const MISSING_CREDENTIAL: &str = "No access token; sign in to load your conversations";

pub(crate) struct AppCore {
    state: AppState,
    rev: u64,

    update_sender: Sender<AppUpdate>,
    core_sender: Sender<CoreMsg>,
    shared_state: Arc<RwLock<AppState>>,

    config: ClientConfig,
    /// None until a credential is available; every network path checks and
    /// reports the standing error instead.
    api: Option<Arc<dyn ChatApi>>,
    runtime: tokio::runtime::Runtime,
}

impl AppCore {
    pub(crate) fn new(
        update_sender: Sender<AppUpdate>,
        core_sender: Sender<CoreMsg>,
        config: ClientConfig,
        api: Option<Arc<dyn ChatApi>>,
        shared_state: Arc<RwLock<AppState>>,
    ) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .enable_io()
            .build()
            .expect("tokio runtime");

        Self {
            state: AppState::empty(),
            rev: 0,
            update_sender,
            core_sender,
            shared_state,
            config,
            api,
            runtime,
        }
    }

    pub(crate) fn handle_message(&mut self, msg: CoreMsg) {
        match msg {
            CoreMsg::Action(ref action) => {
                // Log the tag only: actions can carry message content.
                tracing::info!(action = action.tag(), "dispatch");
                self.handle_action(action.clone());
            }
            CoreMsg::Internal(internal) => self.handle_internal(*internal),
            CoreMsg::Shutdown => {}
        }
    }

    fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::Refresh => self.spawn_fetch_cycle(),
            AppAction::SelectConversation { conversation_id } => {
                self.select_conversation(conversation_id)
            }
            AppAction::ClearSelection => self.handle_clear_selection(),
            AppAction::SetDraft { text } => {
                self.state.draft = text;
                self.emit_state();
            }
            AppAction::SetReplyTarget { message_id } => self.handle_set_reply_target(message_id),
            AppAction::ClearReplyTarget => {
                self.state.reply_target = None;
                self.emit_state();
            }
            AppAction::SetAttachment { data_base64 } => {
                self.state.pending_attachment = Some(data_base64);
                self.emit_state();
            }
            AppAction::ClearAttachment => {
                self.state.pending_attachment = None;
                self.emit_state();
            }
            AppAction::SendMessage { content } => self.handle_send_message(content),
            AppAction::LoadFriends => self.handle_load_friends(),
            AppAction::StartChat { friend_id } => self.handle_start_chat(friend_id),
            AppAction::CreateGroup {
                name,
                participant_ids,
                picture_base64,
            } => self.handle_create_group(name, participant_ids, picture_base64),
            AppAction::SetConversationFilter { term } => {
                self.state.conversation_filter = term;
                self.emit_state();
            }
            AppAction::SetFriendFilter { term } => {
                self.state.friend_filter = term;
                self.emit_state();
            }
            AppAction::SetPage { page } => self.handle_set_page(page),
            AppAction::ClearError => {
                self.state.last_error = None;
                self.emit_state();
            }
        }
    }

    fn handle_internal(&mut self, internal: InternalEvent) {
        match internal {
            InternalEvent::PollTick => self.spawn_fetch_cycle(),
            InternalEvent::CycleFetched {
                headers,
                all,
                unread,
            } => self.handle_cycle_fetched(headers, all, unread),
            InternalEvent::CycleFailed { error } => self.handle_cycle_failed(error),
            InternalEvent::FriendsFetched { friends } => self.handle_friends_fetched(friends),
            InternalEvent::FriendsFailed { error } => self.handle_friends_failed(error),
            InternalEvent::ConversationCreated {
                conversation,
                origin,
            } => self.handle_conversation_created(conversation, origin),
            InternalEvent::CreateConversationFailed { error } => {
                self.handle_create_conversation_failed(error)
            }
            InternalEvent::SendMessageResult {
                conversation_id,
                local_id,
                server_id,
                ok,
                error,
            } => self.handle_send_result(conversation_id, local_id, server_id, ok, error),
            InternalEvent::MarkedRead {
                conversation_id,
                message_ids,
            } => self.handle_marked_read(conversation_id, message_ids),
            InternalEvent::MarkReadFailed {
                conversation_id,
                error,
            } => self.handle_mark_read_failed(conversation_id, error),
        }
    }

    // ── Selection ───────────────────────────────────────────────────

    pub(super) fn select_conversation(&mut self, conversation_id: u64) {
        if self.state.conversation(conversation_id).is_none() {
            self.set_error("Unknown conversation");
            return;
        }
        self.state.selected_conversation_id = Some(conversation_id);
        // Reply targets reference messages of the previous conversation.
        self.state.reply_target = None;
        self.refresh_current_conversation();
        self.spawn_mark_read(conversation_id);
        self.emit_state();
    }

    fn handle_clear_selection(&mut self) {
        self.state.selected_conversation_id = None;
        self.state.current_conversation = None;
        self.state.draft.clear();
        self.state.reply_target = None;
        self.state.pending_attachment = None;
        self.emit_state();
    }

    fn handle_set_reply_target(&mut self, message_id: MessageId) {
        let target = self
            .state
            .selected_conversation()
            .and_then(|c| c.messages.iter().find(|m| m.id == message_id))
            .cloned();
        match target {
            Some(message) => {
                self.state.reply_target = Some(message);
                self.emit_state();
            }
            None => self.set_error("That message is no longer available to reply to"),
        }
    }

    fn handle_set_page(&mut self, page: u32) {
        self.state.page = page.clamp(1, self.state.total_pages.max(1));
        self.emit_state();
        self.spawn_fetch_cycle();
    }

    // ── Read receipts ───────────────────────────────────────────────

    /// One request per unread message, sequentially. A failure partway leaves
    /// some messages read server-side; the next poll reconciles.
    fn spawn_mark_read(&mut self, conversation_id: u64) {
        let Some(api) = self.api.clone() else { return };
        let me = self.config.user_id;
        let Some(conv) = self.state.conversation(conversation_id) else {
            return;
        };
        let targets: Vec<(MessageId, u64)> = conv
            .messages
            .iter()
            .filter(|m| !m.is_read && m.sender_id != Some(me))
            .filter_map(|m| m.id.server_id().map(|sid| (m.id.clone(), sid)))
            .collect();
        if targets.is_empty() {
            return;
        }

        let tx = self.core_sender.clone();
        self.runtime.spawn(async move {
            for (_, server_id) in &targets {
                if let Err(e) = api.mark_message_read(*server_id).await {
                    let _ = tx.send(CoreMsg::Internal(Box::new(InternalEvent::MarkReadFailed {
                        conversation_id,
                        error: e.to_string(),
                    })));
                    return;
                }
            }
            let message_ids = targets.into_iter().map(|(id, _)| id).collect();
            let _ = tx.send(CoreMsg::Internal(Box::new(InternalEvent::MarkedRead {
                conversation_id,
                message_ids,
            })));
        });
    }

    fn handle_marked_read(&mut self, conversation_id: u64, message_ids: Vec<MessageId>) {
        tracing::info!(conversation_id, count = message_ids.len(), "marked_read");
        if let Some(conv) = self
            .state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            for m in conv
                .messages
                .iter_mut()
                .filter(|m| message_ids.contains(&m.id))
            {
                m.is_read = true;
            }
            conv.unread_count = 0;
        }
        self.refresh_current_conversation();
        self.emit_state();
    }

    fn handle_mark_read_failed(&mut self, conversation_id: u64, error: String) {
        // Never surfaced: the next poll's unread recomputation self-heals.
        tracing::warn!(%error, conversation_id, "mark_read_failed");
    }

    // ── Snapshot plumbing ───────────────────────────────────────────

    fn next_rev(&mut self) -> u64 {
        self.rev += 1;
        self.state.rev = self.rev;
        self.rev
    }

    fn commit_state_snapshot(&self, snapshot: &AppState) {
        match self.shared_state.write() {
            Ok(mut g) => *g = snapshot.clone(),
            Err(poison) => *poison.into_inner() = snapshot.clone(),
        }
    }

    pub(super) fn emit_state(&mut self) {
        self.next_rev();
        let snapshot = self.state.clone();
        self.commit_state_snapshot(&snapshot);
        let _ = self.update_sender.send(AppUpdate::FullState(snapshot));
    }

    pub(super) fn refresh_current_conversation(&mut self) {
        let current = self.state.selected_conversation().cloned();
        self.state.current_conversation = current;
    }

    pub(super) fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(error = %message, "surface_error");
        self.state.last_error = Some(message);
        self.emit_state();
    }

    /// Standing error, surfaced once; polling keeps ticking but stays idle.
    pub(super) fn report_missing_credential(&mut self) {
        if self.state.last_error.as_deref() == Some(MISSING_CREDENTIAL) {
            return;
        }
        self.set_error(MISSING_CREDENTIAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{SenderDto, SentMessageDto};
    use async_trait::async_trait;
    use flume::Receiver;

    struct FakeApi;

    #[async_trait]
    impl ChatApi for FakeApi {
        async fn fetch_conversations(
            &self,
            _page: u32,
            _page_size: u32,
        ) -> Result<Page<ConversationDto>, ApiError> {
            Ok(Page::default())
        }

        async fn fetch_all_messages(
            &self,
            _page: u32,
            _page_size: u32,
        ) -> Result<Page<MessageDto>, ApiError> {
            Ok(Page::default())
        }

        async fn fetch_unread_messages(
            &self,
            _page: u32,
            _page_size: u32,
        ) -> Result<Page<MessageDto>, ApiError> {
            Ok(Page::default())
        }

        async fn mark_message_read(&self, _message_id: u64) -> Result<(), ApiError> {
            Ok(())
        }

        async fn send_message(&self, _req: SendMessageRequest) -> Result<SentMessageDto, ApiError> {
            Ok(SentMessageDto { id: Some(77) })
        }

        async fn create_conversation(
            &self,
            _req: CreateConversationRequest,
        ) -> Result<ConversationDto, ApiError> {
            Err(ApiError::Status {
                status: 500,
                detail: "not under test".into(),
            })
        }

        async fn fetch_followings(&self, _user_id: u64) -> Result<Vec<crate::api::FriendDto>, ApiError> {
            Ok(vec![])
        }
    }

    fn test_config() -> ClientConfig {
        ClientConfig {
            user_id: 1,
            user_name: "Test User".into(),
            token: Some("token".into()),
            ..ClientConfig::default()
        }
    }

    fn make_core(api: Option<Arc<dyn ChatApi>>) -> (AppCore, Receiver<CoreMsg>) {
        let (update_tx, _update_rx) = flume::unbounded();
        let (core_tx, core_rx) = flume::unbounded();
        let core = AppCore::new(
            update_tx,
            core_tx,
            test_config(),
            api,
            Arc::new(RwLock::new(AppState::empty())),
        );
        (core, core_rx)
    }

    fn message_dto(id: u64, conversation_id: u64) -> MessageDto {
        MessageDto {
            id: Some(id),
            conversation_id,
            content: Some(format!("m{id}")),
            sender: Some(SenderDto {
                id: Some(50),
                first_name: Some("Farid".into()),
                last_name: None,
                profile_picture: None,
            }),
            sent_at: Some(Utc::now()),
            kind: Some(0),
            reply_to_message_id: None,
            attachment: None,
        }
    }

    fn conversation_dto(id: u64, title: &str) -> ConversationDto {
        ConversationDto {
            id,
            title: Some(title.to_string()),
            participants: vec![],
            is_group: Some(false),
            profile_picture: None,
            group_picture_file: None,
        }
    }

    /// Runs one fetched cycle through the core so tests start from a
    /// populated conversation list.
    fn seed_conversation(core: &mut AppCore, conversation_id: u64) {
        core.handle_cycle_fetched(
            vec![conversation_dto(conversation_id, "Seeded")],
            Page {
                items: vec![message_dto(1, conversation_id)],
                total_pages: Some(3),
            },
            vec![],
        );
    }

    #[test]
    fn cycle_fetched_populates_state() {
        let (mut core, _rx) = make_core(None);
        seed_conversation(&mut core, 5);
        assert_eq!(core.state.conversations.len(), 1);
        assert_eq!(core.state.conversations[0].display_title, "Seeded");
        assert_eq!(core.state.conversations[0].messages.len(), 1);
        assert_eq!(core.state.total_pages, 3);
        assert!(core.state.rev > 0);
    }

    #[test]
    fn send_without_selection_is_rejected() {
        let (mut core, _rx) = make_core(Some(Arc::new(FakeApi)));
        core.handle_send_message("hello".into());
        assert!(core.state.last_error.as_deref().unwrap().contains("Select"));
        assert!(!core.state.busy.sending);
    }

    #[test]
    fn send_empty_without_attachment_is_rejected() {
        let (mut core, rx) = make_core(Some(Arc::new(FakeApi)));
        seed_conversation(&mut core, 5);
        core.select_conversation(5);
        core.handle_send_message("   ".into());
        assert!(core
            .state
            .last_error
            .as_deref()
            .unwrap()
            .contains("attach"));
        // Rejected before any network call: nothing was spawned.
        assert!(rx.try_recv().is_err());
        assert!(!core.state.busy.sending);
    }

    #[test]
    fn send_with_attachment_only_uses_placeholder_content() {
        let (mut core, _rx) = make_core(Some(Arc::new(FakeApi)));
        seed_conversation(&mut core, 5);
        core.select_conversation(5);
        core.state.pending_attachment = Some("aGVsbG8=".into());
        core.handle_send_message(String::new());

        let conv = core.state.conversation(5).unwrap();
        let sent = conv
            .messages
            .iter()
            .find(|m| m.delivery == DeliveryState::Pending)
            .expect("optimistic message");
        assert_eq!(sent.content, ATTACHMENT_PLACEHOLDER);
        assert!(core.state.busy.sending);
        assert!(core.state.pending_attachment.is_none());
    }

    #[test]
    fn send_with_undecodable_attachment_aborts_before_network() {
        let (mut core, _rx) = make_core(Some(Arc::new(FakeApi)));
        seed_conversation(&mut core, 5);
        core.select_conversation(5);
        core.state.pending_attachment = Some("!!! not base64 !!!".into());
        core.handle_send_message("caption".into());

        assert!(core.state.last_error.as_deref().unwrap().contains("base64"));
        assert!(!core.state.busy.sending);
        assert_eq!(core.state.conversation(5).unwrap().messages.len(), 1);
    }

    #[test]
    fn send_while_sending_is_rejected() {
        let (mut core, _rx) = make_core(Some(Arc::new(FakeApi)));
        seed_conversation(&mut core, 5);
        core.select_conversation(5);
        core.state.busy.sending = true;
        core.handle_send_message("hello".into());
        assert!(core
            .state
            .last_error
            .as_deref()
            .unwrap()
            .contains("already in progress"));
    }

    #[test]
    fn send_result_adopts_server_id() {
        let (mut core, _rx) = make_core(Some(Arc::new(FakeApi)));
        seed_conversation(&mut core, 5);
        core.select_conversation(5);
        core.handle_send_message("hello".into());
        let local_id = core
            .state
            .conversation(5)
            .unwrap()
            .messages
            .iter()
            .find(|m| m.delivery == DeliveryState::Pending)
            .unwrap()
            .id
            .clone();

        core.handle_send_result(5, local_id, Some(42), true, None);
        let conv = core.state.conversation(5).unwrap();
        let adopted = conv
            .messages
            .iter()
            .find(|m| m.id == MessageId::Server(42))
            .expect("server id adopted");
        assert_eq!(adopted.delivery, DeliveryState::Sent);
        assert!(!core.state.busy.sending);
    }

    #[test]
    fn send_result_drops_local_copy_when_poll_already_delivered() {
        let (mut core, _rx) = make_core(Some(Arc::new(FakeApi)));
        seed_conversation(&mut core, 5);
        core.select_conversation(5);
        core.handle_send_message("hello".into());
        let local_id = core
            .state
            .conversation(5)
            .unwrap()
            .messages
            .iter()
            .find(|m| m.delivery == DeliveryState::Pending)
            .unwrap()
            .id
            .clone();

        // A racing poll delivers the server copy before the send resolves.
        core.handle_cycle_fetched(
            vec![],
            Page {
                items: vec![message_dto(42, 5)],
                total_pages: Some(1),
            },
            vec![],
        );
        core.handle_send_result(5, local_id.clone(), Some(42), true, None);

        let conv = core.state.conversation(5).unwrap();
        assert!(!conv.messages.iter().any(|m| m.id == local_id));
        assert_eq!(
            conv.messages
                .iter()
                .filter(|m| m.id == MessageId::Server(42))
                .count(),
            1
        );
    }

    #[test]
    fn send_result_failure_marks_message_failed() {
        let (mut core, _rx) = make_core(Some(Arc::new(FakeApi)));
        seed_conversation(&mut core, 5);
        core.select_conversation(5);
        core.handle_send_message("hello".into());
        let local_id = core
            .state
            .conversation(5)
            .unwrap()
            .messages
            .iter()
            .find(|m| m.delivery == DeliveryState::Pending)
            .unwrap()
            .id
            .clone();

        core.handle_send_result(5, local_id.clone(), None, false, Some("server said no".into()));
        let conv = core.state.conversation(5).unwrap();
        let failed = conv.messages.iter().find(|m| m.id == local_id).unwrap();
        assert_eq!(
            failed.delivery,
            DeliveryState::Failed {
                reason: "server said no".into()
            }
        );
        assert!(core
            .state
            .last_error
            .as_deref()
            .unwrap()
            .contains("server said no"));
    }

    #[test]
    fn select_unknown_conversation_surfaces_error() {
        let (mut core, _rx) = make_core(None);
        core.select_conversation(99);
        assert!(core.state.last_error.is_some());
        assert_eq!(core.state.selected_conversation_id, None);
    }

    #[test]
    fn selecting_refreshes_current_conversation_view() {
        let (mut core, _rx) = make_core(None);
        seed_conversation(&mut core, 5);
        core.select_conversation(5);
        assert_eq!(core.state.current_conversation.as_ref().unwrap().id, 5);
    }

    #[test]
    fn clear_selection_resets_composer_state() {
        let (mut core, _rx) = make_core(None);
        seed_conversation(&mut core, 5);
        core.select_conversation(5);
        core.state.draft = "half-typed".into();
        core.state.pending_attachment = Some("aGVsbG8=".into());
        core.handle_clear_selection();

        assert_eq!(core.state.selected_conversation_id, None);
        assert!(core.state.current_conversation.is_none());
        assert!(core.state.draft.is_empty());
        assert!(core.state.reply_target.is_none());
        assert!(core.state.pending_attachment.is_none());
    }

    #[test]
    fn marked_read_flips_flags_and_resets_count() {
        let (mut core, _rx) = make_core(None);
        core.handle_cycle_fetched(
            vec![conversation_dto(5, "Seeded")],
            Page {
                items: vec![message_dto(1, 5)],
                total_pages: Some(1),
            },
            vec![message_dto(2, 5)],
        );
        assert_eq!(core.state.conversation(5).unwrap().unread_count, 1);

        core.handle_marked_read(5, vec![MessageId::Server(2)]);
        let conv = core.state.conversation(5).unwrap();
        assert!(conv.messages.iter().all(|m| m.is_read));
        assert_eq!(conv.unread_count, 0);
    }

    #[test]
    fn missing_credential_is_a_standing_error() {
        let (mut core, _rx) = make_core(None);
        core.spawn_fetch_cycle();
        assert_eq!(core.state.last_error.as_deref(), Some(MISSING_CREDENTIAL));
        let rev_after_first = core.state.rev;

        // Subsequent ticks keep the message without re-emitting it.
        core.spawn_fetch_cycle();
        assert_eq!(core.state.rev, rev_after_first);
    }

    #[test]
    fn cycle_failure_keeps_polling_state_and_surfaces_error() {
        let (mut core, _rx) = make_core(None);
        seed_conversation(&mut core, 5);
        core.handle_cycle_failed("connection refused".into());
        assert!(core
            .state
            .last_error
            .as_deref()
            .unwrap()
            .contains("connection refused"));
        // Existing state is untouched by a failed cycle.
        assert_eq!(core.state.conversations.len(), 1);
    }

    #[test]
    fn start_chat_with_existing_conversation_selects_without_create() {
        let (mut core, rx) = make_core(Some(Arc::new(FakeApi)));
        core.handle_cycle_fetched(
            vec![ConversationDto {
                id: 5,
                title: Some("Rana".into()),
                participants: vec![crate::api::ParticipantDto {
                    id: Some(9),
                    first_name: Some("Rana".into()),
                    last_name: None,
                    profile_picture: None,
                }],
                is_group: Some(false),
                profile_picture: None,
                group_picture_file: None,
            }],
            Page {
                items: vec![message_dto(1, 5)],
                total_pages: Some(1),
            },
            vec![],
        );
        core.state.friends = vec![crate::state::Friend {
            id: 9,
            user_name: "rana".into(),
            avatar_url: None,
        }];

        core.handle_start_chat(9);
        assert_eq!(core.state.selected_conversation_id, Some(5));
        assert!(!core.state.busy.creating_chat);
        // No create request was spawned.
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn create_group_requires_name_and_participants() {
        let (mut core, _rx) = make_core(Some(Arc::new(FakeApi)));
        core.handle_create_group("  ".into(), vec![1], None);
        assert!(core.state.last_error.as_deref().unwrap().contains("name"));

        core.handle_create_group("Reading club".into(), vec![], None);
        assert!(core
            .state
            .last_error
            .as_deref()
            .unwrap()
            .contains("participant"));
        assert!(!core.state.busy.creating_chat);
    }

    #[test]
    fn conversation_created_falls_back_to_local_identity() {
        let (mut core, _rx) = make_core(Some(Arc::new(FakeApi)));
        let friend = crate::state::Friend {
            id: 9,
            user_name: "rana".into(),
            avatar_url: Some("https://cdn.example/rana.jpg".into()),
        };
        core.handle_conversation_created(
            ConversationDto {
                id: 11,
                title: None,
                participants: vec![],
                is_group: Some(false),
                profile_picture: None,
                group_picture_file: None,
            },
            CreateOrigin::Direct { friend },
        );

        let conv = core.state.conversation(11).unwrap();
        assert_eq!(conv.display_title, "rana");
        assert!(conv.has_participant(9));
        assert!(conv.has_participant(1));
        assert_eq!(core.state.selected_conversation_id, Some(11));
    }

    #[test]
    fn group_created_includes_caller_even_when_response_omits_it() {
        let (mut core, _rx) = make_core(Some(Arc::new(FakeApi)));
        core.handle_conversation_created(
            ConversationDto {
                id: 12,
                title: Some("Reading club".into()),
                participants: vec![crate::api::ParticipantDto {
                    id: Some(9),
                    first_name: Some("Rana".into()),
                    last_name: None,
                    profile_picture: None,
                }],
                is_group: Some(true),
                profile_picture: None,
                group_picture_file: None,
            },
            CreateOrigin::Group {
                name: "Reading club".into(),
            },
        );

        let conv = core.state.conversation(12).unwrap();
        assert!(conv.is_group);
        assert!(conv.has_participant(1));
        assert!(conv.has_participant(9));
        assert_eq!(conv.participants[0].id, 1);
    }

    #[test]
    fn set_page_clamps_to_known_range() {
        let (mut core, _rx) = make_core(None);
        seed_conversation(&mut core, 5);
        core.handle_set_page(99);
        assert_eq!(core.state.page, 3);
        core.handle_set_page(0);
        assert_eq!(core.state.page, 1);
    }
}
