//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::eligibility::SUPPORTED_PLATFORM;
use super::*;
use crate::config::ReactionConfig;
use proptest::prelude::*;
use std::collections::BTreeSet;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_transport() -> impl Strategy<Value = Transport> {
    let platform = prop_oneof![
        4 => Just(Some(SUPPORTED_PLATFORM.to_string())),
        1 => Just(Some("discord".to_string())),
        1 => Just(None),
    ];
    let context = prop_oneof![
        3 => Just(ChatContext::Group),
        1 => Just(ChatContext::Direct),
    ];
    (platform, context).prop_map(|(platform, context)| Transport {
        platform: platform.map(|name| PlatformMeta { name }),
        context,
    })
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_transport().prop_map(|transport| Event::RequestStarted {
            message_id: MessageId::from(1),
            transport,
        }),
        Just(Event::ResponseReceived),
        arb_transport().prop_map(|transport| Event::MessageSent { transport }),
        (any::<bool>(), any::<bool>()).prop_map(|(added_done, removed_thinking)| {
            Event::FinishAttempted {
                added_done,
                removed_thinking,
            }
        }),
    ]
}

fn arb_reaction_ids() -> impl Strategy<Value = BTreeSet<i64>> {
    proptest::collection::btree_set(0i64..400, 0..4)
}

fn arb_config() -> impl Strategy<Value = ReactionConfig> {
    (
        prop_oneof![4 => Just(true), 1 => Just(false)],
        arb_reaction_ids(),
        arb_reaction_ids(),
        any::<bool>(),
    )
        .prop_map(
            |(enabled, thinking_reaction_ids, done_reaction_ids, remove_thinking_on_done)| {
                ReactionConfig {
                    enabled,
                    thinking_reaction_ids,
                    done_reaction_ids,
                    remove_thinking_on_done,
                }
            },
        )
}

/// State before an event, the event, and what the transition returned
type Step = (Option<MessageState>, Event, Result<TransitionResult, Skip>);

/// Apply every event, keeping the state on success like the store does
fn run(config: &ReactionConfig, events: Vec<Event>) -> Vec<Step> {
    let mut state: Option<MessageState> = None;
    let mut trace = Vec::new();
    for event in events {
        let result = transition(state.as_ref(), config, event.clone());
        let before = state.clone();
        if let Ok(r) = &result {
            state = Some(r.new_state.clone());
        }
        trace.push((before, event, result));
    }
    trace
}

// ============================================================================
// Invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// The retry count never exceeds the budget and done/failed never coexist
    #[test]
    fn prop_retry_budget_bounded(config in arb_config(), events in proptest::collection::vec(arb_event(), 0..40)) {
        for (_, _, result) in run(&config, events) {
            if let Ok(r) = result {
                prop_assert!(r.new_state.finish_retry_count <= MAX_FINISH_ATTEMPTS);
                prop_assert!(!(r.new_state.done && r.new_state.failed));
            }
        }
    }

    /// Terminal states absorb every later event without effects
    #[test]
    fn prop_terminal_states_absorb(config in arb_config(), events in proptest::collection::vec(arb_event(), 0..40)) {
        for (before, _, result) in run(&config, events) {
            let Some(before) = before else { continue };
            if !before.is_terminal() {
                continue;
            }
            if let Ok(r) = result {
                prop_assert!(r.effects.is_empty());
                prop_assert_eq!(r.new_state.done, before.done);
                prop_assert_eq!(r.new_state.failed, before.failed);
                prop_assert_eq!(r.new_state.finish_retry_count, before.finish_retry_count);
            }
        }
    }

    /// Only request-started creates state
    #[test]
    fn prop_only_request_started_creates(config in arb_config(), event in arb_event()) {
        let is_request = matches!(event, Event::RequestStarted { .. });
        let result = transition(None, &config, event);
        if !is_request {
            prop_assert!(result.is_err());
        }
    }

    /// A completion attempt is only started from a responded, idle state and
    /// always leaves the message finishing
    #[test]
    fn prop_finish_effect_guarded(config in arb_config(), events in proptest::collection::vec(arb_event(), 0..40)) {
        for (before, _, result) in run(&config, events) {
            let Ok(r) = result else { continue };
            let starts_finish = r.effects.iter().any(|e| matches!(e, Effect::Finish { .. }));
            if starts_finish {
                let before = before.expect("finish requires state");
                prop_assert!(config.enabled);
                prop_assert!(before.llm_responded);
                prop_assert!(!before.finishing);
                prop_assert!(!before.is_terminal());
                prop_assert!(before.finish_retry_count < MAX_FINISH_ATTEMPTS);
                prop_assert!(r.new_state.finishing);
            }
        }
    }

    /// Batches are strictly ascending, which implies de-duplicated
    #[test]
    fn prop_batches_sorted_unique(config in arb_config(), events in proptest::collection::vec(arb_event(), 0..40)) {
        for (_, _, result) in run(&config, events) {
            let Ok(r) = result else { continue };
            for effect in r.effects {
                let batches = match effect {
                    Effect::ApplyThinking { batch } => vec![batch],
                    Effect::Finish { add_done, remove_thinking } => {
                        let mut batches = vec![add_done];
                        batches.extend(remove_thinking);
                        batches
                    }
                };
                for batch in batches {
                    prop_assert!(batch.reaction_ids.windows(2).all(|w| w[0] < w[1]));
                }
            }
        }
    }

    /// Skips never change anything: the next transition sees the old state
    #[test]
    fn prop_skip_has_no_effect(config in arb_config(), events in proptest::collection::vec(arb_event(), 1..40)) {
        let trace = run(&config, events);
        for pair in trace.windows(2) {
            let (before, _, result) = &pair[0];
            let (next_before, _, _) = &pair[1];
            if result.is_err() {
                prop_assert_eq!(before, next_before);
            }
        }
    }
}
