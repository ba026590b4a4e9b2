//! Application handlers.
//!
//! Command handlers that orchestrate calls through the ports.

pub mod answer_question;

pub use answer_question::{
    AnswerError, AnswerQuestionCommand, AnswerQuestionHandler, AnswerQuestionResult,
    FallbackReplies, PollPolicy, QueryAnswer,
};
