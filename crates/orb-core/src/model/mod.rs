//! Completion-service port and its outcome types.

pub mod client;
pub mod types;
