//! Lifecycle controller
//!
//! Runs the pure state machine for each notification and executes the
//! resulting reaction effects against the gateway.

mod store;


pub use store::{MessageStore, TrackedMessage, DEFAULT_STATE_TTL, DEFAULT_STORE_CAPACITY};

use crate::config::ReactionConfig;
use crate::gateway::ReactionGateway;
use crate::state_machine::{
    transition, Effect, Event, MessageId, MessageState, Notification, NotificationKind,
    ReactionBatch, Skip,
};

/// What happened to a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    /// The state machine accepted it; carries the resulting state
    Applied(MessageState),
    /// Ignored without side effects
    Skipped(Skip),
}

/// Per-message reaction lifecycle.
///
/// Never returns errors to the host: skips and gateway failures are absorbed
/// into state and logged.
pub struct LifecycleController<G> {
    config: ReactionConfig,
    /// `None` when the platform offers no reaction capability
    gateway: Option<G>,
    store: MessageStore,
}

impl<G: ReactionGateway> LifecycleController<G> {
    pub fn new(config: ReactionConfig, gateway: Option<G>, store: MessageStore) -> Self {
        Self {
            config,
            gateway,
            store,
        }
    }

    pub fn has_gateway(&self) -> bool {
        self.gateway.is_some()
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Route a notification to its entry point
    pub async fn handle(&self, notification: Notification) -> Handled {
        match notification.kind {
            NotificationKind::RequestStarted => self.on_request_started(notification).await,
            NotificationKind::ResponseReceived => self.on_response_received(notification).await,
            NotificationKind::MessageSent => self.on_message_sent(notification).await,
        }
    }

    /// The host started waiting on an LLM request: add the thinking reaction
    pub async fn on_request_started(&self, notification: Notification) -> Handled {
        tracing::debug!(message_id = ?notification.message_id, "Request started");
        self.dispatch(notification).await
    }

    /// The LLM answered: mark the message so completion can run
    pub async fn on_response_received(&self, notification: Notification) -> Handled {
        tracing::debug!(message_id = ?notification.message_id, "Response received");
        self.dispatch(notification).await
    }

    /// The reply was delivered: swap thinking for done
    pub async fn on_message_sent(&self, notification: Notification) -> Handled {
        tracing::debug!(message_id = ?notification.message_id, "Message sent");
        self.dispatch(notification).await
    }

    async fn dispatch(&self, mut notification: Notification) -> Handled {
        let Some(message_id) = notification.message_id.take() else {
            tracing::debug!(kind = ?notification.kind, "Skipping notification without message id");
            return Handled::Skipped(Skip::MissingMessageId);
        };

        let completing = notification.kind == NotificationKind::MessageSent;
        let event = notification.into_event(message_id.clone());
        let (mut state, effects) = match self.apply(&message_id, event) {
            Ok(applied) => applied,
            Err(skip) => {
                tracing::debug!(message_id = %message_id, reason = %skip, "Skipping notification");
                return Handled::Skipped(skip);
            }
        };

        if completing && state.failed {
            tracing::warn!(
                message_id = %message_id,
                attempts = state.finish_retry_count,
                "Giving up on completion reactions"
            );
        }

        for effect in effects {
            if let Some(next) = self.execute(&message_id, effect).await {
                state = next;
            }
        }

        Handled::Applied(state)
    }

    fn apply(
        &self,
        message_id: &MessageId,
        event: Event,
    ) -> Result<(MessageState, Vec<Effect>), Skip> {
        self.store
            .apply(message_id, |current| transition(current, &self.config, event))
    }

    /// Execute an effect, returning the updated state if it fed an event back
    async fn execute(&self, message_id: &MessageId, effect: Effect) -> Option<MessageState> {
        match effect {
            Effect::ApplyThinking { batch } => {
                self.apply_batch(message_id, &batch).await;
                None
            }

            Effect::Finish {
                add_done,
                remove_thinking,
            } => {
                let mut pending = PendingFinish::new(&self.store, &self.config, message_id);
                let added_done = self.apply_batch(message_id, &add_done).await;
                let removed_thinking = match &remove_thinking {
                    Some(batch) => self.apply_batch(message_id, batch).await,
                    None => true,
                };
                pending.complete();

                let event = Event::FinishAttempted {
                    added_done,
                    removed_thinking,
                };
                match self.apply(message_id, event) {
                    Ok((state, _)) => {
                        if state.done {
                            tracing::info!(message_id = %message_id, "Completion reactions applied");
                        } else {
                            tracing::info!(
                                message_id = %message_id,
                                added_done,
                                removed_thinking,
                                attempts = state.finish_retry_count,
                                "Completion reactions incomplete, will retry on next delivery"
                            );
                        }
                        Some(state)
                    }
                    Err(skip) => {
                        // The entry can expire or be evicted while calls are in flight
                        tracing::warn!(
                            message_id = %message_id,
                            reason = %skip,
                            "Dropped completion outcome"
                        );
                        None
                    }
                }
            }
        }
    }

    /// Issue every call in the batch, in order. True only if all succeeded;
    /// an empty batch or a missing gateway is trivially successful.
    async fn apply_batch(&self, message_id: &MessageId, batch: &ReactionBatch) -> bool {
        if batch.is_empty() {
            tracing::debug!(
                message_id = %message_id,
                direction = batch.direction(),
                "No reaction ids configured, nothing to do"
            );
            return true;
        }
        let Some(gateway) = &self.gateway else {
            tracing::debug!(message_id = %message_id, "No reaction gateway, skipping reactions");
            return true;
        };

        let mut all_ok = true;
        for &reaction_id in &batch.reaction_ids {
            tracing::debug!(
                message_id = %message_id,
                reaction_id,
                direction = batch.direction(),
                "Setting reaction"
            );
            if let Err(e) = gateway
                .set_reaction(message_id, reaction_id, batch.enable)
                .await
            {
                all_ok = false;
                tracing::warn!(
                    message_id = %message_id,
                    reaction_id,
                    direction = batch.direction(),
                    kind = ?e.kind,
                    error = %e,
                    "Failed to set reaction"
                );
            }
        }
        all_ok
    }
}

/// An in-flight completion attempt.
///
/// If the attempt is dropped before `complete` (the caller's future was
/// cancelled), it is recorded as a failed attempt so the message leaves
/// `finishing` and the next delivery can retry.
struct PendingFinish<'a> {
    store: &'a MessageStore,
    config: &'a ReactionConfig,
    message_id: &'a MessageId,
    completed: bool,
}

impl<'a> PendingFinish<'a> {
    fn new(store: &'a MessageStore, config: &'a ReactionConfig, message_id: &'a MessageId) -> Self {
        Self {
            store,
            config,
            message_id,
            completed: false,
        }
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for PendingFinish<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let event = Event::FinishAttempted {
            added_done: false,
            removed_thinking: false,
        };
        match self
            .store
            .apply(self.message_id, |current| transition(current, self.config, event))
        {
            Ok((state, _)) => tracing::warn!(
                message_id = %self.message_id,
                attempts = state.finish_retry_count,
                "Completion attempt cancelled, counted as failed"
            ),
            Err(skip) => tracing::debug!(
                message_id = %self.message_id,
                reason = %skip,
                "Completion attempt cancelled after state was dropped"
            ),
        }
    }
}
