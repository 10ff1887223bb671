//! tubecast-core: shared channel types, errors, and configuration.
//!
//! This crate is the foundational dependency for the other tubecast crates,
//! providing the validated channel identifier, a unified error type, and the
//! JSON application configuration.

pub mod channel;
pub mod config;
pub mod error;

// Re-export the most commonly used items at the crate root.
pub use channel::{ChannelConfig, ChannelName};
pub use config::Config;
pub use error::{Error, Result};
