//! Core domain + application logic for the allow-listed Telegram relay.
//!
//! This crate is intentionally framework-agnostic. Telegram and OpenRouter
//! live behind ports (traits) implemented in adapter crates.

pub mod allowlist;
pub mod classify;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod model;
pub mod utils;

pub use errors::{Error, Result};
