//! Reaction options and service settings

use crate::controller::{DEFAULT_STATE_TTL, DEFAULT_STORE_CAPACITY};
use crate::gateway::OneBotConfig;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_THINKING_REACTION: i64 = 66;
const DEFAULT_DONE_REACTION: i64 = 74;
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ONEBOT_TIMEOUT: Duration = Duration::from_secs(5);

// Accepted spellings per option, first match wins
const ENABLED_KEYS: &[&str] = &["enabled"];
const THINKING_KEYS: &[&str] = &[
    "thinking_reaction_ids",
    "thinking_emoji_ids",
    "thinkingReactionIds",
];
const DONE_KEYS: &[&str] = &["done_reaction_ids", "done_emoji_ids", "doneReactionIds"];
const REMOVE_THINKING_KEYS: &[&str] = &["remove_thinking_on_done", "removeThinkingOnDone"];

/// Errors reading the options file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Normalized reaction options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionConfig {
    pub enabled: bool,
    pub thinking_reaction_ids: BTreeSet<i64>,
    pub done_reaction_ids: BTreeSet<i64>,
    pub remove_thinking_on_done: bool,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            thinking_reaction_ids: BTreeSet::from([DEFAULT_THINKING_REACTION]),
            done_reaction_ids: BTreeSet::from([DEFAULT_DONE_REACTION]),
            remove_thinking_on_done: true,
        }
    }
}

impl ReactionConfig {
    /// Build from raw host options. Never fails: malformed values degrade to
    /// defaults or are dropped.
    pub fn load(options: &Value) -> Self {
        let defaults = Self::default();
        Self {
            enabled: lookup(options, ENABLED_KEYS).map_or(defaults.enabled, is_truthy),
            thinking_reaction_ids: lookup(options, THINKING_KEYS)
                .map_or(defaults.thinking_reaction_ids, reaction_id_set),
            done_reaction_ids: lookup(options, DONE_KEYS)
                .map_or(defaults.done_reaction_ids, reaction_id_set),
            remove_thinking_on_done: lookup(options, REMOVE_THINKING_KEYS)
                .map_or(defaults.remove_thinking_on_done, is_truthy),
        }
    }

    /// Load options from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let options: Value =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::load(&options))
    }
}

fn lookup<'a>(options: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let object = options.as_object()?;
    keys.iter().find_map(|key| object.get(*key))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Scalars become a one-element set, lists are coerced element-wise and
/// null is empty.
fn reaction_id_set(value: &Value) -> BTreeSet<i64> {
    match value {
        Value::Null => BTreeSet::new(),
        Value::Array(items) => items.iter().filter_map(coerce_reaction_id).collect(),
        scalar => coerce_reaction_id(scalar).into_iter().collect(),
    }
}

/// Finite floats truncate toward zero; anything else that is not an integer
/// or an integer string is dropped.
#[allow(clippy::cast_possible_truncation)]
fn coerce_reaction_id(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < 9.2e18)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ============================================================================
// Service settings
// ============================================================================

/// Process-level settings read from the environment
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    /// JSON file with reaction options; defaults apply when unset
    pub options_path: Option<PathBuf>,
    /// Reaction API endpoint; no gateway when unset
    pub onebot: Option<OneBotConfig>,
    pub store_capacity: NonZeroUsize,
    pub state_ttl: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| var(key).and_then(|v| v.trim().parse::<u64>().ok());

        let onebot = var("ONEBOT_URL")
            .filter(|url| !url.trim().is_empty())
            .map(|base_url| OneBotConfig {
                base_url,
                access_token: var("ONEBOT_ACCESS_TOKEN").filter(|t| !t.is_empty()),
                timeout: parsed("ONEBOT_TIMEOUT_MS")
                    .map_or(DEFAULT_ONEBOT_TIMEOUT, Duration::from_millis),
            });

        Self {
            port: var("REACTIONS_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            options_path: var("REACTIONS_CONFIG")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            onebot,
            store_capacity: parsed("REACTIONS_STORE_CAPACITY")
                .and_then(|n| usize::try_from(n).ok())
                .and_then(NonZeroUsize::new)
                .unwrap_or(DEFAULT_STORE_CAPACITY),
            state_ttl: parsed("REACTIONS_STATE_TTL_SECS")
                .map_or(DEFAULT_STATE_TTL, Duration::from_secs),
        }
    }
}
