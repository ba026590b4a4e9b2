//! Domain layer containing the gateway's vocabulary and pure logic.
//!
//! # Module Organization
//!
//! - `assistant` - Threads, runs, messages, assistant selection and reply extraction

pub mod assistant;
