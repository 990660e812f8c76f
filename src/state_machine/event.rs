//! Notifications from the host and the events they become

use super::state::MessageId;
use serde::{Deserialize, Serialize};

/// Which host hook fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The host is about to wait on an LLM request for this message
    RequestStarted,
    /// The LLM response arrived
    ResponseReceived,
    /// The reply was delivered to the chat
    MessageSent,
}

/// Platform metadata attached by the host adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformMeta {
    pub name: String,
}

/// Where the message was posted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatContext {
    Group,
    #[default]
    Direct,
}

/// Transport details carried by every notification
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transport {
    #[serde(default)]
    pub platform: Option<PlatformMeta>,
    #[serde(default)]
    pub context: ChatContext,
}

impl Transport {
    pub fn new(platform: impl Into<String>, context: ChatContext) -> Self {
        Self {
            platform: Some(PlatformMeta {
                name: platform.into(),
            }),
            context,
        }
    }
}

/// A notification as delivered by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    #[serde(default)]
    pub message_id: Option<MessageId>,
    #[serde(flatten)]
    pub transport: Transport,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        message_id: impl Into<MessageId>,
        transport: Transport,
    ) -> Self {
        Self {
            kind,
            message_id: Some(message_id.into()),
            transport,
        }
    }

    /// Convert into a state machine event
    pub fn into_event(self, message_id: MessageId) -> Event {
        match self.kind {
            NotificationKind::RequestStarted => Event::RequestStarted {
                message_id,
                transport: self.transport,
            },
            NotificationKind::ResponseReceived => Event::ResponseReceived,
            NotificationKind::MessageSent => Event::MessageSent {
                transport: self.transport,
            },
        }
    }
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RequestStarted {
        message_id: MessageId,
        transport: Transport,
    },
    ResponseReceived,
    MessageSent {
        transport: Transport,
    },
    /// Outcome of a completion attempt, reported by the executor
    FinishAttempted {
        added_done: bool,
        removed_thinking: bool,
    },
}
