// Polling driver + fetch-cycle side effects.

use super::*;

impl AppCore {
    /// Recurring reconciliation trigger. The first tick fires immediately,
    /// which doubles as the fetch-on-activation call.
    pub(crate) fn start_polling(&mut self) {
        let tx = self.core_sender.clone();
        let period = self.config.poll_interval();
        self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                if tx
                    .send(CoreMsg::Internal(Box::new(InternalEvent::PollTick)))
                    .is_err()
                {
                    // Actor gone; the timer dies with it.
                    return;
                }
            }
        });
    }

    /// Follow-up reconciliation shortly after a mutation, to absorb
    /// server-assigned ids and read-state side effects.
    pub(super) fn schedule_refresh(&self, delay: Duration) {
        let tx = self.core_sender.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(CoreMsg::Internal(Box::new(InternalEvent::PollTick)));
        });
    }

    /// One complete fetch: conversation headers + all-messages page + unread
    /// page. Cycles may overlap; the merge rules make completion order
    /// irrelevant.
    pub(super) fn spawn_fetch_cycle(&mut self) {
        let Some(api) = self.api.clone() else {
            self.report_missing_credential();
            return;
        };
        let tx = self.core_sender.clone();
        let page = self.state.page;
        let conversations_page_size = self.config.conversations_page_size;
        let messages_page_size = self.config.messages_page_size;
        self.runtime.spawn(async move {
            let result = async {
                let headers = api.fetch_conversations(1, conversations_page_size).await?;
                let all = api.fetch_all_messages(page, messages_page_size).await?;
                let unread = api.fetch_unread_messages(1, messages_page_size).await?;
                Ok::<_, ApiError>((headers, all, unread))
            }
            .await;
            let event = match result {
                Ok((headers, all, unread)) => InternalEvent::CycleFetched {
                    headers: headers.items,
                    all,
                    unread: unread.items,
                },
                Err(e) => InternalEvent::CycleFailed {
                    error: e.to_string(),
                },
            };
            let _ = tx.send(CoreMsg::Internal(Box::new(event)));
        });
    }

    pub(super) fn handle_cycle_fetched(
        &mut self,
        headers: Vec<ConversationDto>,
        all: Page<MessageDto>,
        unread: Vec<MessageDto>,
    ) {
        let assets = self.config.assets.clone();
        let total_pages = all.total_pages.unwrap_or(1).max(1);

        let all_messages: Vec<_> = all
            .items
            .into_iter()
            .map(|dto| normalize_message(dto, Feed::All, &assets))
            .collect();
        let unread_messages: Vec<_> = unread
            .into_iter()
            .map(|dto| normalize_message(dto, Feed::Unread, &assets))
            .collect();

        let (merged, unread_counts) = overlay_unread(all_messages, unread_messages);
        let headers = header_map(headers);
        let prev = std::mem::take(&mut self.state.conversations);
        self.state.conversations = reconcile_cycle(
            prev,
            &headers,
            merged,
            &unread_counts,
            self.config.user_id,
            &assets,
        );
        self.state.total_pages = total_pages;

        // Keep the visible chat consistent with the updated global state.
        self.refresh_current_conversation();
        self.emit_state();
    }

    pub(super) fn handle_cycle_failed(&mut self, error: String) {
        tracing::warn!(%error, "fetch_cycle_failed");
        // The timer keeps running; the next tick retries.
        self.set_error(format!("Failed to fetch messages: {error}"));
    }
}
