//! Pure state transition function

use super::effect::{Effect, ReactionBatch};
use super::eligibility::{self, ContextRule, Ineligible};
use super::event::{Event, Transport};
use super::state::{MessageId, MessageState};
use crate::config::ReactionConfig;
use thiserror::Error;

/// Completion attempts allowed before a message is marked failed
pub const MAX_FINISH_ATTEMPTS: u32 = 3;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: MessageState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: MessageState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Reasons a notification is ignored.
///
/// None of these are failures: the host pipeline carries on and no state
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Skip {
    #[error("reactions are disabled")]
    Disabled,
    #[error("{0}")]
    Ineligible(#[from] Ineligible),
    #[error("notification has no message id")]
    MissingMessageId,
    #[error("message is already tracked")]
    AlreadyTracked,
    #[error("message is not tracked")]
    NotTracked,
    #[error("message is not active")]
    Inactive,
    #[error("LLM has not responded yet")]
    AwaitingResponse,
    #[error("completion reactions already applied")]
    AlreadyDone,
    #[error("completion already gave up")]
    AlreadyFailed,
    #[error("completion attempt already in progress")]
    Finishing,
    #[error("no completion attempt in progress")]
    NotFinishing,
}

/// Pure transition function.
///
/// Given the same inputs it always produces the same outputs; reaction calls
/// are described by the returned effects and executed by the caller.
pub fn transition(
    state: Option<&MessageState>,
    config: &ReactionConfig,
    event: Event,
) -> Result<TransitionResult, Skip> {
    match event {
        Event::RequestStarted {
            message_id,
            transport,
        } => request_started(state, config, message_id, &transport),
        Event::ResponseReceived => response_received(state),
        Event::MessageSent { transport } => message_sent(state, config, &transport),
        Event::FinishAttempted {
            added_done,
            removed_thinking,
        } => finish_attempted(state, added_done && removed_thinking),
    }
}

fn request_started(
    state: Option<&MessageState>,
    config: &ReactionConfig,
    message_id: MessageId,
    transport: &Transport,
) -> Result<TransitionResult, Skip> {
    if !config.enabled {
        return Err(Skip::Disabled);
    }
    eligibility::check(transport, ContextRule::GroupOnly)?;
    if state.is_some() {
        return Err(Skip::AlreadyTracked);
    }

    Ok(
        TransitionResult::new(MessageState::started(message_id)).with_effect(
            Effect::ApplyThinking {
                batch: ReactionBatch::add(&config.thinking_reaction_ids),
            },
        ),
    )
}

fn response_received(state: Option<&MessageState>) -> Result<TransitionResult, Skip> {
    let state = state.ok_or(Skip::NotTracked)?;
    if !state.active {
        return Err(Skip::Inactive);
    }

    let mut next = state.clone();
    next.llm_responded = true;
    Ok(TransitionResult::new(next))
}

fn message_sent(
    state: Option<&MessageState>,
    config: &ReactionConfig,
    transport: &Transport,
) -> Result<TransitionResult, Skip> {
    if !config.enabled {
        return Err(Skip::Disabled);
    }
    let state = state.ok_or(Skip::NotTracked)?;
    if !state.active {
        return Err(Skip::Inactive);
    }
    if !state.llm_responded {
        return Err(Skip::AwaitingResponse);
    }
    if state.done {
        return Err(Skip::AlreadyDone);
    }
    if state.failed {
        return Err(Skip::AlreadyFailed);
    }
    if state.finishing {
        return Err(Skip::Finishing);
    }
    eligibility::check(transport, ContextRule::Any)?;

    let mut next = state.clone();

    // Budget is checked before the attempt, so a message that failed three
    // times is only marked failed on the next delivery notification.
    if state.finish_retry_count >= MAX_FINISH_ATTEMPTS {
        next.failed = true;
        return Ok(TransitionResult::new(next));
    }

    next.finishing = true;
    let remove_thinking = config
        .remove_thinking_on_done
        .then(|| ReactionBatch::remove(&config.thinking_reaction_ids));

    Ok(TransitionResult::new(next).with_effect(Effect::Finish {
        add_done: ReactionBatch::add(&config.done_reaction_ids),
        remove_thinking,
    }))
}

fn finish_attempted(
    state: Option<&MessageState>,
    succeeded: bool,
) -> Result<TransitionResult, Skip> {
    let state = state.ok_or(Skip::NotTracked)?;
    if !state.finishing {
        return Err(Skip::NotFinishing);
    }

    let mut next = state.clone();
    next.finishing = false;
    if succeeded {
        next.done = true;
    } else {
        next.finish_retry_count += 1;
    }
    Ok(TransitionResult::new(next))
}
