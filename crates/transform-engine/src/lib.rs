//! Reelsync Transform Engine
//!
//! Turns declarative transform descriptions into rendered media files.
//!
//! # Pipeline
//!
//! ```text
//! TransformDescription ── filtergraph ──► "-vf" string
//!                                            │
//! source.mp4 ───────────── ffmpeg ◄──────────┘
//!                            │
//!                            ▼
//!                  <output_dir>/<stem>-<pid>-<n>.mp4
//! ```
//!
//! [`FfmpegExecutor`] implements the engine's `TransformExecutor` contract.
//! The simulated executors stand in for it where no ffmpeg is installed.

pub mod ffmpeg;
pub mod filtergraph;
pub mod probe;
pub mod simulated;

pub use ffmpeg::FfmpegExecutor;
pub use filtergraph::render_filter_graph;
pub use probe::probe_duration;
pub use simulated::{FailingExecutor, InstantExecutor};
