//! Assistant Gateway - HTTP front door for a hosted conversational assistant
//!
//! This crate relays questions to an assistant service, waits for the run to
//! finish, and returns the reply split into prose and an optional JSON payload.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
