//! Choosing which configured assistant handles a question.

use super::ids::AssistantId;

/// Tag callers send to route a question to the registration assistant.
pub const REGISTRATION_TAG: &str = "registration";

/// Which of the configured assistants should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AssistantKind {
    #[default]
    Primary,
    Registration,
}

impl AssistantKind {
    /// Maps the caller's `assistant_type` tag.
    ///
    /// Only an exact `"registration"` selects the registration assistant;
    /// every other value, including none, selects the primary one.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some(REGISTRATION_TAG) => AssistantKind::Registration,
            _ => AssistantKind::Primary,
        }
    }
}

/// The pair of assistant identities the gateway routes between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantIdentities {
    pub primary: AssistantId,
    pub registration: AssistantId,
}

impl AssistantIdentities {
    pub fn new(primary: AssistantId, registration: AssistantId) -> Self {
        Self {
            primary,
            registration,
        }
    }

    /// Returns the identity for the given kind.
    pub fn resolve(&self, kind: AssistantKind) -> &AssistantId {
        match kind {
            AssistantKind::Primary => &self.primary,
            AssistantKind::Registration => &self.registration,
        }
    }
}
