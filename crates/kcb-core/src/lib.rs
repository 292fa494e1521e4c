//! Core domain + application logic for the gallery bot.
//!
//! This crate is framework-agnostic. Telegram and HTTP live in adapter crates;
//! the messaging transport sits behind the `DeliveryChannel` port.

pub mod config;
pub mod domain;
pub mod errors;
pub mod gallery;
pub mod interpreter;
pub mod logging;
pub mod messaging;
pub mod security;
pub mod session;

pub use errors::{Error, Result};
