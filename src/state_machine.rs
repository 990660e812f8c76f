//! Per-message reaction state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! The executor in `controller` runs the effects and feeds completion
//! outcomes back in as events.

mod effect;
pub mod eligibility;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, ReactionBatch};
pub use event::{ChatContext, Event, Notification, NotificationKind, PlatformMeta, Transport};
pub use state::{MessageId, MessageState, Phase};
pub use transition::{transition, Skip, TransitionResult, MAX_FINISH_ATTEMPTS};
