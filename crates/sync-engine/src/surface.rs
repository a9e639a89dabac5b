//! Collaborator contracts.
//!
//! Playback surfaces and transform executors live outside the engine. The
//! runtime drives them through these traits and feeds their notifications
//! back as session events.

use async_trait::async_trait;

use reelsync_common::error::{JobFailure, ReelsyncResult};
use reelsync_media_model::{MediaRef, TransformDescription};

use crate::command::{AudioCommand, VideoCommand};

/// The primary playback surface (video plus its own audio track).
#[async_trait]
pub trait MediaSurface: Send {
    /// Load media and return its duration in seconds.
    async fn load(&mut self, media: &MediaRef) -> ReelsyncResult<f64>;

    fn seek(&mut self, position: f64);

    fn set_rate(&mut self, rate: f64);

    fn play(&mut self);

    fn pause(&mut self);

    fn set_muted(&mut self, muted: bool);

    /// Live filter parameter. Surfaces without a shader ignore it.
    fn set_shader_amount(&mut self, amount: f64) {
        tracing::debug!(amount, "Surface has no live shader, ignoring");
    }
}

/// The secondary (audio-only) playback surface.
#[async_trait]
pub trait AudioSurface: Send {
    /// Load audio and return its duration. Fails for missing files or
    /// unsupported codecs.
    async fn load(&mut self, media: &MediaRef) -> ReelsyncResult<f64>;

    fn play(&mut self);

    fn pause(&mut self);

    fn stop(&mut self);

    fn set_position(&mut self, position: f64);

    fn is_playing(&self) -> bool;
}

/// Produces a filtered copy of a media artifact.
#[async_trait]
pub trait TransformExecutor: Send + Sync {
    async fn execute(
        &self,
        source: &MediaRef,
        description: &TransformDescription,
    ) -> Result<MediaRef, JobFailure>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Apply a non-load video command.
pub(crate) fn apply_video(surface: &mut dyn MediaSurface, command: &VideoCommand) {
    match *command {
        VideoCommand::Load { .. } => {
            tracing::warn!("Load must be awaited by the caller, ignoring");
        }
        VideoCommand::Seek { position } => surface.seek(position),
        VideoCommand::SetRate { rate } => surface.set_rate(rate),
        VideoCommand::Play => surface.play(),
        VideoCommand::Pause => surface.pause(),
        VideoCommand::SetMuted { muted } => surface.set_muted(muted),
    }
}

/// Apply an audio command.
///
/// `Play` is skipped when the surface already reports playing.
pub(crate) fn apply_audio(surface: &mut dyn AudioSurface, command: AudioCommand) {
    match command {
        AudioCommand::Play => {
            if !surface.is_playing() {
                surface.play();
            }
        }
        AudioCommand::Pause => surface.pause(),
        AudioCommand::Stop => surface.stop(),
        AudioCommand::Seek { position } => surface.set_position(position),
    }
}
