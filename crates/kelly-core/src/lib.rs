//! Core domain + application logic for the Kelly relay bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the Kelly API
//! backend live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod ports;
pub mod reply;
pub mod store;

pub use errors::{Error, Result};
