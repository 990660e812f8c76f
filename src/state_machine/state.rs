//! Message state types

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Message Id
// ============================================================================

/// Platform message identifier.
///
/// `OneBot` implementations hand out numeric ids while some bridges use
/// strings. Numeric strings are normalized to `Numeric` so that `"42"` and
/// `42` address the same message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged, from = "RawMessageId")]
pub enum MessageId {
    Numeric(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMessageId {
    Numeric(i64),
    Text(String),
}

impl From<RawMessageId> for MessageId {
    fn from(raw: RawMessageId) -> Self {
        match raw {
            RawMessageId::Numeric(id) => MessageId::Numeric(id),
            RawMessageId::Text(text) => MessageId::from(text),
        }
    }
}

impl From<String> for MessageId {
    fn from(text: String) -> Self {
        text.trim()
            .parse::<i64>()
            .map_or(MessageId::Text(text), MessageId::Numeric)
    }
}

impl From<&str> for MessageId {
    fn from(text: &str) -> Self {
        MessageId::from(text.to_string())
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        MessageId::Numeric(id)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Numeric(id) => write!(f, "{id}"),
            MessageId::Text(text) => f.write_str(text),
        }
    }
}

// ============================================================================
// Message State
// ============================================================================

/// Lifecycle record for one tracked message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageState {
    pub message_id: MessageId,
    /// A thinking reaction has been requested
    pub active: bool,
    /// The response-received notification has fired
    pub llm_responded: bool,
    /// Completion reactions fully applied (terminal)
    pub done: bool,
    /// Retry budget exhausted (terminal)
    pub failed: bool,
    /// A completion attempt is in flight
    pub finishing: bool,
    pub finish_retry_count: u32,
}

impl MessageState {
    /// State for a message whose LLM request just started
    pub fn started(message_id: MessageId) -> Self {
        Self {
            message_id,
            active: true,
            llm_responded: false,
            done: false,
            failed: false,
            finishing: false,
            finish_retry_count: 0,
        }
    }

    /// Check if no further transition can change this state
    pub fn is_terminal(&self) -> bool {
        self.done || self.failed
    }

    pub fn phase(&self) -> Phase {
        if self.failed {
            Phase::Failed
        } else if self.done {
            Phase::Done
        } else if self.finishing {
            Phase::Finishing
        } else if self.llm_responded {
            Phase::Responded
        } else if self.active {
            Phase::Active
        } else {
            Phase::Idle
        }
    }
}

/// Coarse lifecycle phase derived from the state flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Active,
    Responded,
    Finishing,
    Done,
    Failed,
}
