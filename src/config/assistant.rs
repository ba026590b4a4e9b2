//! Assistant service configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::ai::OpenAIThreadsConfig;
use crate::application::handlers::PollPolicy;
use crate::domain::assistant::{AssistantId, AssistantIdentities};

/// Assistant service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// API key for the assistant service
    pub api_key: Secret<String>,

    /// Assistant used for ordinary questions
    pub primary_assistant_id: String,

    /// Assistant used when callers send `assistant_type = "registration"`
    pub registration_assistant_id: String,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Delay between run status checks in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Total time to wait for a run to finish, in seconds
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Maximum number of run status checks
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

impl AssistantConfig {
    /// Creates a configuration with defaults for everything but credentials.
    pub fn new(
        api_key: impl Into<String>,
        primary_assistant_id: impl Into<String>,
        registration_assistant_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            primary_assistant_id: primary_assistant_id.into(),
            registration_assistant_id: registration_assistant_id.into(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            poll_interval_ms: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }

    /// Get the upstream request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Poll loop limits
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_secs(self.poll_timeout_secs),
            max_attempts: self.max_poll_attempts,
        }
    }

    /// The two configured assistant identities
    pub fn identities(&self) -> AssistantIdentities {
        AssistantIdentities::new(
            AssistantId::new(self.primary_assistant_id.clone()),
            AssistantId::new(self.registration_assistant_id.clone()),
        )
    }

    /// Settings for the HTTP client adapter
    pub fn client_config(&self) -> OpenAIThreadsConfig {
        OpenAIThreadsConfig::new(self.api_key.expose_secret().clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(self.request_timeout())
    }

    /// Validate assistant configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("ASSISTANT__API_KEY"));
        }
        if self.primary_assistant_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired(
                "ASSISTANT__PRIMARY_ASSISTANT_ID",
            ));
        }
        if self.registration_assistant_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired(
                "ASSISTANT__REGISTRATION_ASSISTANT_ID",
            ));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }
        if self.poll_timeout_secs == 0 {
            return Err(ValidationError::InvalidPollTimeout);
        }
        if self.max_poll_attempts == 0 {
            return Err(ValidationError::InvalidPollAttempts);
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_poll_timeout() -> u64 {
    600
}

fn default_max_poll_attempts() -> u32 {
    600
}
