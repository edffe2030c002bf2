// Friend fetching and conversation creation.

use super::*;

impl AppCore {
    pub(super) fn handle_load_friends(&mut self) {
        let Some(api) = self.api.clone() else {
            self.report_missing_credential();
            return;
        };
        let user_id = self.config.user_id;
        let tx = self.core_sender.clone();
        self.runtime.spawn(async move {
            let event = match api.fetch_followings(user_id).await {
                Ok(friends) => InternalEvent::FriendsFetched { friends },
                Err(e) => InternalEvent::FriendsFailed {
                    error: e.to_string(),
                },
            };
            let _ = tx.send(CoreMsg::Internal(Box::new(event)));
        });
    }

    pub(super) fn handle_friends_fetched(&mut self, friends: Vec<FriendDto>) {
        self.state.friends = normalize_friends(friends);
        self.state.friends_error = None;
        self.emit_state();
    }

    pub(super) fn handle_friends_failed(&mut self, error: String) {
        tracing::warn!(%error, "friends_fetch_failed");
        self.state.friends_error = Some(format!("Failed to fetch friends: {error}"));
        self.emit_state();
    }

    pub(super) fn handle_start_chat(&mut self, friend_id: u64) {
        if self.state.busy.creating_chat {
            self.set_error("Conversation setup is already in progress");
            return;
        }
        let Some(friend) = self
            .state
            .friends
            .iter()
            .find(|f| f.id == friend_id)
            .cloned()
        else {
            self.set_error("Unknown friend; reload the list and try again");
            return;
        };

        // An existing 1:1 with this friend is selected directly, no network.
        if let Some(existing) = self
            .state
            .conversations
            .iter()
            .find(|c| !c.is_group && c.has_participant(friend.id))
            .map(|c| c.id)
        {
            self.state.conversation_filter.clear();
            self.state.friend_filter.clear();
            self.select_conversation(existing);
            return;
        }

        let Some(api) = self.api.clone() else {
            self.report_missing_credential();
            return;
        };

        self.state.busy.creating_chat = true;
        self.emit_state();

        let req = CreateConversationRequest {
            title: friend.user_name.clone(),
            is_group: false,
            participant_ids: vec![friend.id],
            picture_base64: None,
        };
        self.spawn_create_conversation(api, req, CreateOrigin::Direct { friend });
    }

    pub(super) fn handle_create_group(
        &mut self,
        name: String,
        participant_ids: Vec<u64>,
        picture_base64: Option<String>,
    ) {
        let name = name.trim().to_string();
        if name.is_empty() {
            self.set_error("Enter a group name");
            return;
        }
        if participant_ids.is_empty() {
            self.set_error("Select at least one participant");
            return;
        }
        if self.state.busy.creating_chat {
            self.set_error("Conversation setup is already in progress");
            return;
        }
        let Some(api) = self.api.clone() else {
            self.report_missing_credential();
            return;
        };

        self.state.busy.creating_chat = true;
        self.emit_state();

        let req = CreateConversationRequest {
            title: name.clone(),
            is_group: true,
            participant_ids,
            picture_base64,
        };
        self.spawn_create_conversation(api, req, CreateOrigin::Group { name });
    }

    fn spawn_create_conversation(
        &self,
        api: Arc<dyn ChatApi>,
        req: CreateConversationRequest,
        origin: CreateOrigin,
    ) {
        let tx = self.core_sender.clone();
        self.runtime.spawn(async move {
            let event = match api.create_conversation(req).await {
                Ok(conversation) => InternalEvent::ConversationCreated {
                    conversation,
                    origin,
                },
                Err(e) => InternalEvent::CreateConversationFailed {
                    error: e.to_string(),
                },
            };
            let _ = tx.send(CoreMsg::Internal(Box::new(event)));
        });
    }

    pub(super) fn handle_conversation_created(
        &mut self,
        conversation: ConversationDto,
        origin: CreateOrigin,
    ) {
        self.state.busy.creating_chat = false;

        let me_id = self.config.user_id;
        let assets = self.config.assets.clone();
        let header = normalize_header(conversation);
        let conversation_id = header.id;
        tracing::info!(conversation_id, origin = ?origin_tag(&origin), "conversation_created");

        // A racing poll may already have discovered the conversation; then
        // creation only needs to select it.
        if self.state.conversation(conversation_id).is_none() {
            let me = Participant {
                id: me_id,
                first_name: self.config.user_name.clone(),
                last_name: None,
                avatar_url: None,
            };
            let (canonical_title, participants, is_group, avatar_url, refresh_delay) = match &origin
            {
                CreateOrigin::Direct { friend } => {
                    let participants = if header.participants.is_empty() {
                        // Response omitted participants: fall back to the
                        // locally-known friend and user identity.
                        vec![
                            Participant {
                                id: friend.id,
                                first_name: friend.user_name.clone(),
                                last_name: None,
                                avatar_url: friend.avatar_url.clone(),
                            },
                            me,
                        ]
                    } else {
                        header.participants
                    };
                    (
                        header.title.or_else(|| Some(friend.user_name.clone())),
                        participants,
                        header.is_group,
                        header.avatar_url.or_else(|| friend.avatar_url.clone()),
                        self.config.post_send_refresh_delay(),
                    )
                }
                CreateOrigin::Group { name } => {
                    let mut participants: Vec<Participant> = header
                        .participants
                        .into_iter()
                        .filter(|p| p.id != me_id)
                        .collect();
                    // The caller belongs to the group even when the response
                    // forgets to say so.
                    participants.insert(0, me);
                    (
                        header.title.or_else(|| Some(name.clone())),
                        participants,
                        true,
                        header.avatar_url,
                        self.config.post_create_group_refresh_delay(),
                    )
                }
            };

            let mut conv = Conversation {
                id: conversation_id,
                canonical_title,
                display_title: String::new(),
                participants,
                is_group,
                avatar_url,
                display_avatar_url: String::new(),
                messages: vec![],
                last_message: None,
                unread_count: 0,
            };
            resolve_presentation(&mut conv, me_id, &assets);
            self.state.conversations.push(conv);
            sort_conversations(&mut self.state.conversations);
            self.schedule_refresh(refresh_delay);
        }

        self.state.conversation_filter.clear();
        self.state.friend_filter.clear();
        self.select_conversation(conversation_id);
    }

    pub(super) fn handle_create_conversation_failed(&mut self, error: String) {
        tracing::warn!(%error, "create_conversation_failed");
        self.state.busy.creating_chat = false;
        self.set_error(format!("Failed to create conversation: {error}"));
    }
}

fn origin_tag(origin: &CreateOrigin) -> &'static str {
    match origin {
        CreateOrigin::Direct { .. } => "direct",
        CreateOrigin::Group { .. } => "group",
    }
}
