//! Effects produced by state transitions

use std::collections::BTreeSet;

/// One direction of reaction calls for one message.
///
/// Ids are unique and ascending because they come from a `BTreeSet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionBatch {
    pub reaction_ids: Vec<i64>,
    pub enable: bool,
}

impl ReactionBatch {
    pub fn add(reaction_ids: &BTreeSet<i64>) -> Self {
        Self {
            reaction_ids: reaction_ids.iter().copied().collect(),
            enable: true,
        }
    }

    pub fn remove(reaction_ids: &BTreeSet<i64>) -> Self {
        Self {
            reaction_ids: reaction_ids.iter().copied().collect(),
            enable: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reaction_ids.is_empty()
    }

    pub fn direction(&self) -> &'static str {
        if self.enable {
            "add"
        } else {
            "remove"
        }
    }
}

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Put the thinking reactions on the message. The outcome is not fed back.
    ApplyThinking { batch: ReactionBatch },

    /// Run one completion attempt, then report `Event::FinishAttempted`.
    /// `add_done` always runs before `remove_thinking`.
    Finish {
        add_done: ReactionBatch,
        remove_thinking: Option<ReactionBatch>,
    },
}
