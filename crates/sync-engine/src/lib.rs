//! Reelsync Sync Engine
//!
//! Timeline synchronization and transform-job core:
//! - **Clock:** position, trim window, rate and play state of one timeline
//! - **Sync:** keeps a secondary audio track aligned with the primary video
//! - **Scheduler:** time-windowed overlays and their animation phases
//! - **Jobs:** last-request-wins transform jobs with stale-result rejection
//! - **Catalog:** named effects and their transform descriptions
//! - **Session:** one editor session combining the above, emitting surface commands
//! - **Runtime:** async control loop driving real surfaces and executors
//!
//! The engine holds no timers and performs no I/O. Progress notifications
//! from the playback surfaces drive every state change.

pub mod animation;
pub mod catalog;
pub mod clock;
pub mod command;
pub mod jobs;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod surface;
pub mod sync;

pub use animation::AnimationPhase;
pub use catalog::{EffectCatalog, EffectEntry};
pub use clock::{Clock, TickOutcome};
pub use command::{AudioCommand, SurfaceCommand, VideoCommand};
pub use jobs::{
    Completion, JobSeq, JobState, JobTicket, SubmitOutcome, TransformJob, TransformJobManager,
    TransformRequest,
};
pub use runtime::{SessionHandle, SessionRuntime};
pub use scheduler::{OverlayScheduler, VisibleOverlay};
pub use session::{EditorSession, SessionEvent, SessionFeatures, SessionNotice, SessionSnapshot};
pub use surface::{AudioSurface, MediaSurface, TransformExecutor};
pub use sync::{SyncController, SyncPhase, SyncStep};
