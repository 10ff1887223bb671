//! # tubecast-av
//!
//! External tool management and the yt-dlp/ffmpeg pipeline steps for
//! tubecast.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to yt-dlp
//!   and ffmpeg.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Workspace management** ([`Workspace`]) -- temporary directory lifecycle
//!   with atomic publication into the cache.
//! - **Pipeline steps** ([`fetch`], [`transcode`]) -- resolve a channel's
//!   newest upload, download it, and transcode it to the serving rendition.

pub mod command;
pub mod fetch;
pub mod tools;
pub mod transcode;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use fetch::LatestVideo;
pub use tools::{ToolInfo, ToolRegistry};
pub use workspace::Workspace;
