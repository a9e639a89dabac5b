//! Reelsync Common Utilities
//!
//! Shared infrastructure for all Reelsync crates:
//! - Error taxonomy and result aliases
//! - Media-time helpers for drift measurement between playback tracks
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod time;

pub use config::*;
pub use error::*;
pub use time::*;
