//! API request and response types

use crate::controller::{Handled, TrackedMessage};
use crate::state_machine::{MessageState, Phase};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Message state as exposed over HTTP
#[derive(Debug, Serialize)]
pub struct StateView {
    #[serde(flatten)]
    pub state: MessageState,
    pub phase: Phase,
}

impl From<MessageState> for StateView {
    fn from(state: MessageState) -> Self {
        Self {
            phase: state.phase(),
            state,
        }
    }
}

/// Response to a posted notification
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventResponse {
    Applied { state: StateView },
    Skipped { reason: String },
}

impl From<Handled> for EventResponse {
    fn from(handled: Handled) -> Self {
        match handled {
            Handled::Applied(state) => EventResponse::Applied {
                state: state.into(),
            },
            Handled::Skipped(skip) => EventResponse::Skipped {
                reason: skip.to_string(),
            },
        }
    }
}

/// Response with a tracked message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    #[serde(flatten)]
    pub state: StateView,
    pub tracked_since: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TrackedMessage> for MessageResponse {
    fn from(tracked: TrackedMessage) -> Self {
        Self {
            state: tracked.state.into(),
            tracked_since: tracked.tracked_since,
            updated_at: tracked.updated_at,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub tracked: usize,
    pub gateway: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
