//! Assistant domain - threads, runs, messages and reply extraction.
//!
//! These types model the hosted assistant service's vocabulary. The service
//! owns all conversation state; the gateway only carries identifiers between
//! calls and interprets the final reply.

mod ids;
mod message;
mod reply;
mod run;
mod selector;

pub use ids::{AssistantId, RunId, ThreadId};
pub use message::{latest_assistant_reply, MessageRole, ThreadMessage};
pub use reply::{split_reply, AssistantReply, ReplyParseError, FENCE_CLOSE, JSON_FENCE_OPEN};
pub use run::{Run, RunStatus};
pub use selector::{AssistantIdentities, AssistantKind, REGISTRATION_TAG};
