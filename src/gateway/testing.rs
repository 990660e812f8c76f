//! Mock gateways for testing
//!
//! These mocks let the controller run without a chat platform.

use super::{ReactionError, ReactionGateway};
use crate::state_machine::MessageId;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

/// A recorded `set_reaction` call
pub type ReactionCall = (MessageId, i64, bool);

// ============================================================================
// Mock Gateway
// ============================================================================

/// Records every call and fails the ones it is told to
#[derive(Default)]
pub struct MockGateway {
    calls: Mutex<Vec<ReactionCall>>,
    failing: Mutex<HashSet<(i64, bool)>>,
    fail_all: Mutex<bool>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call for this reaction id and direction
    pub fn fail_reaction(&self, reaction_id: i64, enable: bool) {
        self.failing.lock().unwrap().insert((reaction_id, enable));
    }

    /// Fail every call until `recover` is called
    pub fn fail_all(&self) {
        *self.fail_all.lock().unwrap() = true;
    }

    pub fn recover(&self) {
        *self.fail_all.lock().unwrap() = false;
        self.failing.lock().unwrap().clear();
    }

    /// Get recorded calls
    pub fn calls(&self) -> Vec<ReactionCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, reaction_id: i64, enable: bool) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, id, set)| *id == reaction_id && *set == enable)
            .count()
    }
}

#[async_trait]
impl ReactionGateway for MockGateway {
    async fn set_reaction(
        &self,
        message_id: &MessageId,
        reaction_id: i64,
        enable: bool,
    ) -> Result<(), ReactionError> {
        self.calls
            .lock()
            .unwrap()
            .push((message_id.clone(), reaction_id, enable));

        let fail = *self.fail_all.lock().unwrap()
            || self.failing.lock().unwrap().contains(&(reaction_id, enable));
        if fail {
            Err(ReactionError::connection("mock connection refused"))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Gated Gateway (for re-entrancy testing)
// ============================================================================

/// Mock gateway whose calls block until the test releases them
pub struct GatedGateway {
    inner: MockGateway,
    gate: Semaphore,
    /// Notified when a call reaches the gate
    pub entered: Arc<Notify>,
}

impl GatedGateway {
    pub fn new() -> Self {
        Self {
            inner: MockGateway::new(),
            gate: Semaphore::new(0),
            entered: Arc::new(Notify::new()),
        }
    }

    /// Let `calls` more calls through the gate
    pub fn release(&self, calls: usize) {
        self.gate.add_permits(calls);
    }

    pub fn inner(&self) -> &MockGateway {
        &self.inner
    }
}

#[async_trait]
impl ReactionGateway for GatedGateway {
    async fn set_reaction(
        &self,
        message_id: &MessageId,
        reaction_id: i64,
        enable: bool,
    ) -> Result<(), ReactionError> {
        self.entered.notify_one();
        self.gate.acquire().await.unwrap().forget();
        self.inner.set_reaction(message_id, reaction_id, enable).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_gateway_failures() {
        let mock = MockGateway::new();
        let id = MessageId::from(1);

        assert!(mock.set_reaction(&id, 66, true).await.is_ok());

        mock.fail_reaction(66, false);
        assert!(mock.set_reaction(&id, 66, false).await.is_err());
        assert!(mock.set_reaction(&id, 66, true).await.is_ok());

        mock.fail_all();
        assert!(mock.set_reaction(&id, 74, true).await.is_err());

        mock.recover();
        assert!(mock.set_reaction(&id, 66, false).await.is_ok());
        assert_eq!(mock.calls().len(), 5);
        assert_eq!(mock.count(66, false), 2);
    }

    #[tokio::test]
    async fn test_gated_gateway_blocks_until_released() {
        let gateway = Arc::new(GatedGateway::new());
        let entered = gateway.entered.clone();

        let task = {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                gateway
                    .set_reaction(&MessageId::from(1), 74, true)
                    .await
            })
        };

        entered.notified().await;
        assert!(gateway.inner().calls().is_empty());

        gateway.release(1);
        assert!(task.await.unwrap().is_ok());
        assert_eq!(gateway.inner().calls().len(), 1);
    }
}
