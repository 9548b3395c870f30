//! Conversation controller
//!
//! Owns the single conversation: the durable message log, the optimistic
//! user message of the turn in progress, the selected model and the turn
//! phase. All mutation goes through [`ConversationController::send_turn`],
//! [`ConversationController::clear_conversation`] and
//! [`ConversationController::switch_model`]. Observers follow along through
//! [`ConversationController::subscribe`].


use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::core::adapters::{AdapterSource, ProviderReply, ProviderRequest};
use crate::core::catalog::ModelCatalog;
use crate::core::context;
use crate::core::error::ChatError;
use crate::core::message::Message;
use crate::core::store::MessageStore;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    AwaitingReply,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing happened.
    Ignored,
    Replied(Message),
    /// The conversation was cleared while the call was outstanding.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEvent {
    TurnStarted { model: String, user: Message },
    ReplyReceived { reply: Message },
    TurnFailed { error: ChatError },
    TurnDiscarded,
    /// The caller stopped waiting; the optimistic message stays uncommitted.
    TurnAbandoned,
    Cleared,
    ModelSwitched { model: String },
    PersistenceFailed { error: ChatError },
}

struct Session {
    phase: ConversationState,
    committed: Vec<Message>,
    pending: Option<Message>,
    selected_model: String,
    /// Bumped on every clear; a reply from an older generation is stale.
    generation: u64,
    in_flight: bool,
}

/// Releases the in-flight slot when a `send_turn` future is dropped before
/// its reply settles. The abandoned turn ends like a failed one.
struct InFlightGuard<'a> {
    controller: &'a ConversationController,
    generation: u64,
    settled: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        {
            let mut session = self.controller.lock();
            session.in_flight = false;
            if session.generation == self.generation {
                session.phase = ConversationState::Error;
            }
        }

        warn!("Turn abandoned before the reply arrived");
        self.controller.emit(ConversationEvent::TurnAbandoned);
    }
}

pub struct ConversationController {
    catalog: ModelCatalog,
    adapters: Arc<dyn AdapterSource>,
    store: Arc<dyn MessageStore>,
    session: Mutex<Session>,
    events: broadcast::Sender<ConversationEvent>,
    load_error: Option<ChatError>,
}

impl ConversationController {
    /// Load the persisted log and start `Idle`.
    ///
    /// A log that cannot be read starts the conversation empty; the failure
    /// stays available through [`ConversationController::load_error`].
    pub fn new(
        catalog: ModelCatalog,
        adapters: Arc<dyn AdapterSource>,
        store: Arc<dyn MessageStore>,
        initial_model: Option<&str>,
    ) -> Self {
        let (committed, load_error) = match store.load() {
            Ok(messages) => (messages, None),
            Err(err) => {
                let err = ChatError::from(err);
                warn!(error = %err, "Starting with an empty conversation");
                (Vec::new(), Some(err))
            }
        };

        if let Some(requested) = initial_model.filter(|id| !catalog.contains(id)) {
            warn!(model = requested, "Unknown model requested; using default");
        }
        let selected_model = catalog.initial_selection(initial_model);
        info!(model = %selected_model, messages = committed.len(), "Conversation ready");

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            catalog,
            adapters,
            store,
            session: Mutex::new(Session {
                phase: ConversationState::Idle,
                committed,
                pending: None,
                selected_model,
                generation: 0,
                in_flight: false,
            }),
            events,
            load_error,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: ConversationEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.events.subscribe()
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn load_error(&self) -> Option<&ChatError> {
        self.load_error.as_ref()
    }

    pub fn state(&self) -> ConversationState {
        self.lock().phase
    }

    pub fn selected_model(&self) -> String {
        self.lock().selected_model.clone()
    }

    /// The durable log followed by the optimistic user message, if any.
    pub fn messages(&self) -> Vec<Message> {
        let session = self.lock();
        let mut visible = session.committed.clone();
        visible.extend(session.pending.iter().cloned());
        visible
    }

    pub fn committed_messages(&self) -> Vec<Message> {
        self.lock().committed.clone()
    }

    /// Run one turn against the selected model.
    ///
    /// At most one provider call is outstanding; a second send while one is
    /// pending fails with [`ChatError::TurnInFlight`] and issues nothing.
    /// Dropping the returned future before it settles ends the turn in
    /// `Error`, the same as a failed call.
    pub async fn send_turn(&self, text: &str) -> Result<TurnOutcome, ChatError> {
        if text.trim().is_empty() {
            return Ok(TurnOutcome::Ignored);
        }

        let user = Message::user(text);
        let (generation, model_id, history) = {
            let mut session = self.lock();
            if session.in_flight {
                return Err(ChatError::TurnInFlight);
            }
            if session.pending.is_some() {
                debug!("Dropping unsent message from the failed turn");
            }
            session.pending = Some(user.clone());
            session.phase = ConversationState::AwaitingReply;
            session.in_flight = true;
            (
                session.generation,
                session.selected_model.clone(),
                session.committed.clone(),
            )
        };

        self.emit(ConversationEvent::TurnStarted {
            model: model_id.clone(),
            user: user.clone(),
        });

        let mut guard = InFlightGuard {
            controller: self,
            generation,
            settled: false,
        };
        let result = self.request_reply(&model_id, &history, text).await;
        guard.settled = true;
        self.settle_turn(generation, user, result)
    }

    async fn request_reply(
        &self,
        model_id: &str,
        history: &[Message],
        text: &str,
    ) -> Result<ProviderReply, ChatError> {
        let descriptor = self.catalog.resolve(model_id)?;
        let adapter = self.adapters.adapter_for(descriptor)?;
        let request = ProviderRequest {
            wire_model_name: descriptor.wire_model_name.clone(),
            history: context::assemble(history, text),
        };
        debug!(
            model = model_id,
            provider = %descriptor.provider,
            messages = request.history.len(),
            "Sending turn"
        );
        adapter.complete(request).await
    }

    fn settle_turn(
        &self,
        generation: u64,
        user: Message,
        result: Result<ProviderReply, ChatError>,
    ) -> Result<TurnOutcome, ChatError> {
        let mut session = self.lock();
        session.in_flight = false;

        if session.generation != generation {
            drop(session);
            debug!("Discarding reply for a cleared conversation");
            self.emit(ConversationEvent::TurnDiscarded);
            return Ok(TurnOutcome::Discarded);
        }

        let reply = match result {
            Ok(reply) => Message::assistant(reply.content),
            Err(err) => {
                session.phase = ConversationState::Error;
                drop(session);
                warn!(error = %err, kind = err.kind(), "Turn failed");
                self.emit(ConversationEvent::TurnFailed { error: err.clone() });
                return Err(err);
            }
        };

        session.pending = None;
        session.committed.push(user);
        session.committed.push(reply.clone());
        session.phase = ConversationState::Idle;
        // Saved under the lock so a concurrent clear cannot interleave.
        let saved = self.store.save(&session.committed);
        drop(session);

        self.emit(ConversationEvent::ReplyReceived {
            reply: reply.clone(),
        });
        if let Err(err) = saved {
            let err = ChatError::from(err);
            warn!(error = %err, "Reply kept in memory but not persisted");
            self.emit(ConversationEvent::PersistenceFailed { error: err.clone() });
            return Err(err);
        }
        Ok(TurnOutcome::Replied(reply))
    }

    /// Empty the log in memory and in the store.
    ///
    /// The in-memory log is empty afterwards even when the store fails. An
    /// outstanding call is not cancelled; its reply is discarded.
    pub fn clear_conversation(&self) -> Result<(), ChatError> {
        let cleared = {
            let mut session = self.lock();
            session.committed.clear();
            session.pending = None;
            session.phase = ConversationState::Idle;
            session.generation += 1;
            self.store.clear()
        };

        info!("Conversation cleared");
        self.emit(ConversationEvent::Cleared);
        if let Err(err) = cleared {
            let err = ChatError::from(err);
            warn!(error = %err, "Failed to clear persisted conversation");
            self.emit(ConversationEvent::PersistenceFailed { error: err.clone() });
            return Err(err);
        }
        Ok(())
    }

    /// Select the model for the next turn. History is untouched.
    pub fn switch_model(&self, model_id: &str) -> Result<(), ChatError> {
        let model = self.catalog.resolve(model_id)?.id.clone();
        self.lock().selected_model = model.clone();
        info!(model = %model, "Switched model");
        self.emit(ConversationEvent::ModelSwitched { model });
        Ok(())
    }
}
