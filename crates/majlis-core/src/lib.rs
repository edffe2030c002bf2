//! Client-side conversation/message synchronization engine for a REST chat
//! backend.
//!
//! The engine polls the server on a fixed interval, reconciles the paginated
//! "all messages" and "unread messages" feeds into per-conversation ordered
//! logs, and emits full-state snapshots to the embedding UI. All mutable
//! state lives inside a single actor thread; embedders talk to it through
//! [`ChatClient`].

mod actions;
mod api;
mod config;
mod core;
mod state;
mod updates;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use flume::{Receiver, Sender};

pub use actions::AppAction;
pub use api::{
    ApiError, ChatApi, ConversationDto, CreateConversationRequest, FriendDto, MessageDto, Page,
    ParticipantDto, RestChatApi, SendMessageRequest, SenderDto, SentMessageDto,
};
pub use config::{ClientConfig, DefaultAssets};
pub use state::*;
pub use updates::AppUpdate;

use updates::CoreMsg;

/// Callback surface for the update stream. The engine pushes a full snapshot
/// after every state transition; the listener decides what to do with it.
pub trait UpdateListener: Send + Sync + 'static {
    fn on_update(&self, update: AppUpdate);
}

/// Public handle to the engine. Cheap to share; every method is safe to call
/// from any thread.
pub struct ChatClient {
    core_tx: Sender<CoreMsg>,
    update_rx: Receiver<AppUpdate>,
    listening: AtomicBool,
    shared_state: Arc<RwLock<AppState>>,
}

impl ChatClient {
    /// Starts the engine against the REST backend named in `config`. Fails
    /// only on an unparseable base URL; a missing token starts the engine in
    /// its standing credential-error state instead of failing construction.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let api: Option<Arc<dyn ChatApi>> = match &config.token {
            Some(token) => Some(Arc::new(RestChatApi::new(
                reqwest::Client::new(),
                &config.base_url,
                token.clone(),
            )?)),
            None => None,
        };
        Ok(Self::spawn(config, api))
    }

    /// Starts the engine with a caller-supplied API implementation. This is
    /// the seam tests use, and where a push-based source would plug in.
    pub fn with_api(config: ClientConfig, api: Arc<dyn ChatApi>) -> Self {
        Self::spawn(config, Some(api))
    }

    fn spawn(config: ClientConfig, api: Option<Arc<dyn ChatApi>>) -> Self {
        tracing::info!(base_url = %config.base_url, "chat_client_start");

        let (update_tx, update_rx) = flume::unbounded();
        let (core_tx, core_rx) = flume::unbounded::<CoreMsg>();
        let shared_state = Arc::new(RwLock::new(AppState::empty()));

        // Actor loop thread: the only place state is mutated.
        let core_tx_for_core = core_tx.clone();
        let shared_for_core = shared_state.clone();
        thread::spawn(move || {
            let mut core =
                core::AppCore::new(update_tx, core_tx_for_core, config, api, shared_for_core);
            core.start_polling();
            while let Ok(msg) = core_rx.recv() {
                if matches!(msg, CoreMsg::Shutdown) {
                    break;
                }
                core.handle_message(msg);
            }
            // Dropping the core tears down its runtime; results of in-flight
            // requests are discarded with it.
            tracing::info!("chat_client_stopped");
        });

        Self {
            core_tx,
            update_rx,
            listening: AtomicBool::new(false),
            shared_state,
        }
    }

    /// Current full-state snapshot.
    pub fn state(&self) -> AppState {
        match self.shared_state.read() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    pub fn dispatch(&self, action: AppAction) {
        // Contract: never block caller.
        let _ = self.core_tx.send(CoreMsg::Action(action));
    }

    pub fn listen_for_updates(&self, listener: Box<dyn UpdateListener>) {
        if self
            .listening
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Avoid multiple listeners that would split messages.
            return;
        }

        let rx = self.update_rx.clone();
        thread::spawn(move || {
            while let Ok(update) = rx.recv() {
                listener.on_update(update);
            }
        });
    }

    /// Stops the actor loop and its polling timer. In-flight requests are not
    /// cancelled; their results are dropped.
    pub fn shutdown(&self) {
        let _ = self.core_tx.send(CoreMsg::Shutdown);
    }
}
