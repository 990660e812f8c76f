//! Reaction gateway abstraction
//!
//! The controller only needs one capability from the chat platform: put a
//! reaction on a message, or take it off.

mod onebot;

#[cfg(test)]
pub mod testing;

pub use onebot::{OneBotConfig, OneBotGateway};

use crate::state_machine::MessageId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Reaction error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ReactionError {
    pub kind: ReactionErrorKind,
    pub message: String,
}

impl ReactionError {
    pub fn new(kind: ReactionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ReactionErrorKind::Timeout, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ReactionErrorKind::Connection, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ReactionErrorKind::Rejected, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ReactionErrorKind::Unknown, message)
    }
}

/// Error classification, used for diagnostics only. Every failure counts
/// against the completion retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionErrorKind {
    /// Call did not finish within the client timeout
    Timeout,
    /// Could not reach the platform endpoint
    Connection,
    /// Endpoint answered with a failure status
    Rejected,
    Unknown,
}

impl ReactionErrorKind {
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::Connection)
    }
}

/// Capability to set or clear a reaction on a message
#[async_trait]
pub trait ReactionGateway: Send + Sync {
    async fn set_reaction(
        &self,
        message_id: &MessageId,
        reaction_id: i64,
        enable: bool,
    ) -> Result<(), ReactionError>;
}

#[async_trait]
impl<T: ReactionGateway + ?Sized> ReactionGateway for Arc<T> {
    async fn set_reaction(
        &self,
        message_id: &MessageId,
        reaction_id: i64,
        enable: bool,
    ) -> Result<(), ReactionError> {
        (**self).set_reaction(message_id, reaction_id, enable).await
    }
}

/// Logging wrapper for reaction gateways
pub struct LoggingGateway<G> {
    inner: G,
}

impl<G> LoggingGateway<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<G: ReactionGateway> ReactionGateway for LoggingGateway<G> {
    async fn set_reaction(
        &self,
        message_id: &MessageId,
        reaction_id: i64,
        enable: bool,
    ) -> Result<(), ReactionError> {
        let start = std::time::Instant::now();
        let result = self.inner.set_reaction(message_id, reaction_id, enable).await;
        let duration = start.elapsed();

        match &result {
            Ok(()) => {
                tracing::debug!(
                    message_id = %message_id,
                    reaction_id,
                    enable,
                    duration_ms = %duration.as_millis(),
                    "Reaction call completed"
                );
            }
            Err(e) => {
                tracing::debug!(
                    message_id = %message_id,
                    reaction_id,
                    enable,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    transient = e.kind.is_transient(),
                    "Reaction call failed"
                );
            }
        }

        result
    }
}
