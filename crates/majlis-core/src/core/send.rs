// Optimistic send pipeline.

use super::*;

impl AppCore {
    pub(super) fn handle_send_message(&mut self, content: String) {
        let Some(conversation_id) = self.state.selected_conversation_id else {
            self.set_error("Select a conversation before sending");
            return;
        };
        if self.state.conversation(conversation_id).is_none() {
            self.set_error("The selected conversation no longer exists");
            return;
        }

        let trimmed = content.trim().to_string();
        let attachment = self.state.pending_attachment.clone();
        if trimmed.is_empty() && attachment.is_none() {
            self.set_error("Enter a message or attach a photo");
            return;
        }
        if self.state.busy.sending {
            self.set_error("A send is already in progress");
            return;
        }
        if self.state.busy.creating_chat {
            self.set_error("Conversation setup is in progress");
            return;
        }

        // The embedder supplies the payload already encoded; a payload that
        // does not decode would be rejected by the server anyway, so abort
        // before building the request.
        if let Some(payload) = attachment.as_deref() {
            if BASE64.decode(payload).is_err() {
                self.set_error("Attachment payload is not valid base64");
                return;
            }
        }

        let Some(api) = self.api.clone() else {
            self.report_missing_credential();
            return;
        };

        let reply_to = self
            .state
            .reply_target
            .as_ref()
            .and_then(|m| m.id.server_id());
        let content = if trimmed.is_empty() {
            ATTACHMENT_PLACEHOLDER.to_string()
        } else {
            trimmed
        };

        let local_id = MessageId::new_local();
        let message = ChatMessage {
            id: local_id.clone(),
            conversation_id,
            content: content.clone(),
            sender_id: Some(self.config.user_id),
            sender_display_name: self.config.user_name.clone(),
            sender_avatar_url: self.config.assets.avatar_url.clone(),
            sent_at: Utc::now(),
            kind: MessageKind::Normal,
            reply_to_message_id: reply_to,
            is_read: false,
            attachment: attachment.clone(),
            delivery: DeliveryState::Pending,
        };
        self.insert_local_message(message);

        self.state.draft.clear();
        self.state.reply_target = None;
        self.state.pending_attachment = None;
        self.state.busy.sending = true;

        let req = SendMessageRequest {
            conversation_id,
            content,
            kind: 0,
            attachment: attachment.unwrap_or_default(),
            reply_to_message_id: reply_to.unwrap_or(0),
        };
        let tx = self.core_sender.clone();
        self.runtime.spawn(async move {
            let (ok, server_id, error) = match api.send_message(req).await {
                Ok(sent) => (true, sent.id, None),
                Err(e) => (false, None, Some(e.to_string())),
            };
            let _ = tx.send(CoreMsg::Internal(Box::new(
                InternalEvent::SendMessageResult {
                    conversation_id,
                    local_id,
                    server_id,
                    ok,
                    error,
                },
            )));
        });

        self.emit_state();
    }

    /// Appends a locally-constructed message with the same ordering and
    /// last-message discipline the reconciler uses.
    fn insert_local_message(&mut self, message: ChatMessage) {
        let me = self.config.user_id;
        let assets = self.config.assets.clone();
        if let Some(conv) = self
            .state
            .conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id)
        {
            conv.messages.push(message);
            conv.messages.sort_by_key(|m| m.sent_at);
            conv.last_message = conv.messages.last().cloned();
            resolve_presentation(conv, me, &assets);
        }
        sort_conversations(&mut self.state.conversations);
        self.refresh_current_conversation();
    }

    pub(super) fn handle_send_result(
        &mut self,
        conversation_id: u64,
        local_id: MessageId,
        server_id: Option<u64>,
        ok: bool,
        error: Option<String>,
    ) {
        tracing::info!(ok, ?error, conversation_id, "send_message_result");
        self.state.busy.sending = false;

        if let Some(conv) = self
            .state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            if ok {
                match server_id {
                    Some(sid) if conv.contains_message(&MessageId::Server(sid)) => {
                        // A racing poll already delivered the server copy;
                        // the optimistic one is redundant.
                        conv.messages.retain(|m| m.id != local_id);
                    }
                    Some(sid) => {
                        if let Some(m) = conv.messages.iter_mut().find(|m| m.id == local_id) {
                            m.id = MessageId::Server(sid);
                            m.delivery = DeliveryState::Sent;
                        }
                    }
                    None => {
                        if let Some(m) = conv.messages.iter_mut().find(|m| m.id == local_id) {
                            m.delivery = DeliveryState::Sent;
                        }
                    }
                }
                conv.last_message = conv.messages.last().cloned();
            } else if let Some(m) = conv.messages.iter_mut().find(|m| m.id == local_id) {
                // The optimistic message stays visible, flagged as failed.
                m.delivery = DeliveryState::Failed {
                    reason: error.clone().unwrap_or_else(|| "send failed".into()),
                };
                conv.last_message = conv.messages.last().cloned();
            }
        }

        if ok {
            self.schedule_refresh(self.config.post_send_refresh_delay());
        } else {
            self.state.last_error = Some(format!(
                "Failed to send message: {}",
                error.unwrap_or_else(|| "send failed".into())
            ));
        }

        self.refresh_current_conversation();
        self.emit_state();
    }
}
