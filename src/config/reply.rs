//! Fallback reply texts

use serde::Deserialize;

use super::error::ValidationError;
use crate::application::handlers::FallbackReplies;

/// Texts returned to callers when no assistant answer can be delivered
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyConfig {
    /// Used when the run ends without a usable assistant message
    #[serde(default = "default_no_reply_message")]
    pub no_reply_message: String,

    /// Used when talking to the assistant service fails
    #[serde(default = "default_error_message")]
    pub error_message: String,
}

impl ReplyConfig {
    pub fn fallbacks(&self) -> FallbackReplies {
        FallbackReplies {
            no_reply: self.no_reply_message.clone(),
            error: self.error_message.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.no_reply_message.trim().is_empty() {
            return Err(ValidationError::EmptyFallbackText("REPLY__NO_REPLY_MESSAGE"));
        }
        if self.error_message.trim().is_empty() {
            return Err(ValidationError::EmptyFallbackText("REPLY__ERROR_MESSAGE"));
        }
        Ok(())
    }
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            no_reply_message: default_no_reply_message(),
            error_message: default_error_message(),
        }
    }
}

fn default_no_reply_message() -> String {
    FallbackReplies::default().no_reply
}

fn default_error_message() -> String {
    FallbackReplies::default().error
}
