//! Commands the engine issues to its external collaborators.
//!
//! The engine never drives a surface directly; every decision is returned as
//! a command list so callers can apply them in order on whatever thread owns
//! the surfaces.

use serde::Serialize;

use reelsync_media_model::MediaRef;

use crate::jobs::JobTicket;

/// Command for the primary (video) media surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum VideoCommand {
    Load { media: MediaRef },
    Seek { position: f64 },
    SetRate { rate: f64 },
    Play,
    Pause,
    SetMuted { muted: bool },
}

/// Command for the secondary (audio) surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AudioCommand {
    Play,
    Pause,
    Stop,
    Seek { position: f64 },
}

/// Any command emitted while handling one session event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum SurfaceCommand {
    Video(VideoCommand),
    Audio(AudioCommand),
    /// Live filter parameter for the render surface's shader.
    Shader { amount: f64 },
    /// Hand a job to the transform executor.
    Transform(JobTicket),
}

impl From<VideoCommand> for SurfaceCommand {
    fn from(cmd: VideoCommand) -> Self {
        Self::Video(cmd)
    }
}

impl From<AudioCommand> for SurfaceCommand {
    fn from(cmd: AudioCommand) -> Self {
        Self::Audio(cmd)
    }
}

impl SurfaceCommand {
    /// One-line description for logs and CLI output.
    pub fn describe(&self) -> String {
        match self {
            Self::Video(VideoCommand::Load { media }) => format!("video load {media}"),
            Self::Video(VideoCommand::Seek { position }) => format!("video seek {position:.3}"),
            Self::Video(VideoCommand::SetRate { rate }) => format!("video rate {rate:.2}x"),
            Self::Video(VideoCommand::Play) => "video play".to_string(),
            Self::Video(VideoCommand::Pause) => "video pause".to_string(),
            Self::Video(VideoCommand::SetMuted { muted }) => format!("video muted={muted}"),
            Self::Audio(AudioCommand::Play) => "audio play".to_string(),
            Self::Audio(AudioCommand::Pause) => "audio pause".to_string(),
            Self::Audio(AudioCommand::Stop) => "audio stop".to_string(),
            Self::Audio(AudioCommand::Seek { position }) => format!("audio seek {position:.3}"),
            Self::Shader { amount } => format!("shader amount {amount:.2}"),
            Self::Transform(ticket) => format!(
                "transform job {} effect={} source={}",
                ticket.seq, ticket.request.effect, ticket.request.source
            ),
        }
    }
}

/// Wrap audio commands for a mixed command list.
pub(crate) fn audio(commands: Vec<AudioCommand>) -> impl Iterator<Item = SurfaceCommand> {
    commands.into_iter().map(SurfaceCommand::Audio)
}
