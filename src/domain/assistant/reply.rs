//! Splitting an assistant reply into prose and an embedded JSON payload.
//!
//! Assistants are instructed to append structured data as a fenced block:
//!
//! ````text
//! Here is your data:
//! ```json
//! {"x": 1}
//! ```
//! ````
//!
//! Everything before the opening fence is the prose answer. Everything after
//! it, up to the next closing fence (or the end of the text when the fence is
//! never closed), is parsed as JSON.

use serde_json::Value;

/// Opening marker of an embedded JSON block.
pub const JSON_FENCE_OPEN: &str = "```json";

/// Closing marker of a fenced block.
pub const FENCE_CLOSE: &str = "```";

/// A reply split into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    /// Trimmed prose portion.
    pub text: String,
    /// Parsed payload, when the reply embedded one.
    pub json: Option<Value>,
}

impl AssistantReply {
    /// A reply with prose only.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            json: None,
        }
    }
}

/// The reply announced a JSON block that does not parse.
#[derive(Debug, thiserror::Error)]
#[error("embedded JSON block is malformed: {source}")]
pub struct ReplyParseError {
    /// Trimmed prose that preceded the block.
    pub preamble: String,
    #[source]
    pub source: serde_json::Error,
}

/// Splits raw reply text into prose and an optional JSON payload.
pub fn split_reply(raw: &str) -> Result<AssistantReply, ReplyParseError> {
    let Some((before, after)) = raw.split_once(JSON_FENCE_OPEN) else {
        return Ok(AssistantReply::text_only(raw.trim()));
    };

    let preamble = before.trim().to_string();
    let block = after
        .split_once(FENCE_CLOSE)
        .map_or(after, |(inside, _)| inside)
        .trim();

    match serde_json::from_str(block) {
        Ok(json) => Ok(AssistantReply {
            text: preamble,
            json: Some(json),
        }),
        Err(source) => Err(ReplyParseError { preamble, source }),
    }
}
