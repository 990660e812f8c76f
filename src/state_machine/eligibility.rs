//! Transport filter for notifications

use super::event::{ChatContext, Transport};
use thiserror::Error;

/// The only platform whose reaction API is supported
pub const SUPPORTED_PLATFORM: &str = "aiocqhttp";

/// Whether direct chats are accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextRule {
    GroupOnly,
    Any,
}

/// Why a notification was filtered out
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Ineligible {
    #[error("notification carries no platform metadata")]
    MissingPlatform,
    #[error("unsupported platform `{0}`")]
    UnsupportedPlatform(String),
    #[error("direct chats are not tracked")]
    DirectContext,
}

pub fn check(transport: &Transport, rule: ContextRule) -> Result<(), Ineligible> {
    let platform = transport
        .platform
        .as_ref()
        .ok_or(Ineligible::MissingPlatform)?;

    if platform.name != SUPPORTED_PLATFORM {
        return Err(Ineligible::UnsupportedPlatform(platform.name.clone()));
    }

    if rule == ContextRule::GroupOnly && transport.context != ChatContext::Group {
        return Err(Ineligible::DirectContext);
    }

    Ok(())
}
