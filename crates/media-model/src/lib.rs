//! Reelsync Media Model
//!
//! Defines the data contracts shared by the engine, the transform backend,
//! and the CLI:
//! - **Media:** Opaque references to playable media and track roles
//! - **Overlays:** Time-windowed text/image elements and their animations
//! - **Effects:** Declarative transform descriptions (ordered operations)
//!
//! All times are media seconds relative to the start of the referenced
//! media. Overlay positions are in surface pixels.

pub mod effect;
pub mod media;
pub mod overlay;

pub use effect::*;
pub use media::*;
pub use overlay::*;
