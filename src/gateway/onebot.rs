//! `OneBot` v11 reaction gateway
//!
//! Talks to the HTTP API of an aiocqhttp-compatible bridge and calls its
//! `set_msg_emoji_like` action.

use super::{ReactionError, ReactionGateway};
use crate::state_machine::MessageId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SET_EMOJI_LIKE_ACTION: &str = "set_msg_emoji_like";

/// Connection settings for the `OneBot` HTTP API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneBotConfig {
    pub base_url: String,
    pub access_token: Option<String>,
    /// Per-call timeout; an expired call is an ordinary failure
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct SetEmojiLikeRequest<'a> {
    message_id: &'a MessageId,
    emoji_id: i64,
    set: bool,
}

/// Action response envelope
#[derive(Debug, Deserialize)]
struct ActionResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    retcode: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    wording: Option<String>,
}

impl ActionResponse {
    fn into_result(self) -> Result<(), ReactionError> {
        if self.status == "ok" && self.retcode == 0 {
            return Ok(());
        }
        let detail = self
            .wording
            .or(self.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "no detail".to_string());
        Err(ReactionError::rejected(format!(
            "{SET_EMOJI_LIKE_ACTION} failed (status={}, retcode={}): {detail}",
            self.status, self.retcode
        )))
    }
}

/// Production gateway backed by a `OneBot` HTTP endpoint
pub struct OneBotGateway {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl OneBotGateway {
    pub fn new(config: &OneBotConfig) -> Result<Self, ReactionError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ReactionError::unknown(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: action_url(&config.base_url),
            access_token: config.access_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn action_url(base_url: &str) -> String {
    format!(
        "{}/{SET_EMOJI_LIKE_ACTION}",
        base_url.trim().trim_end_matches('/')
    )
}

fn classify(error: &reqwest::Error) -> ReactionError {
    if error.is_timeout() {
        ReactionError::timeout(format!("Reaction call timed out: {error}"))
    } else if error.is_connect() {
        ReactionError::connection(format!("Cannot reach OneBot endpoint: {error}"))
    } else if error.is_decode() {
        ReactionError::rejected(format!("Unreadable OneBot response: {error}"))
    } else {
        ReactionError::unknown(error.to_string())
    }
}

#[async_trait]
impl ReactionGateway for OneBotGateway {
    async fn set_reaction(
        &self,
        message_id: &MessageId,
        reaction_id: i64,
        enable: bool,
    ) -> Result<(), ReactionError> {
        let mut request = self.client.post(&self.endpoint).json(&SetEmojiLikeRequest {
            message_id,
            emoji_id: reaction_id,
            set: enable,
        });
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| classify(&e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReactionError::rejected(format!(
                "{SET_EMOJI_LIKE_ACTION} returned HTTP {status}"
            )));
        }

        response
            .json::<ActionResponse>()
            .await
            .map_err(|e| classify(&e))?
            .into_result()
    }
}
