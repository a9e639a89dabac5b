//! Unified editor session.
//!
//! One [`EditorSession`] serves every editing screen. Which optional parts are
//! attached (secondary audio, overlays, live or baked filters) is decided by
//! [`SessionFeatures`]; everything else (trim, seek, loop, filter jobs) is
//! shared.
//!
//! The session is synchronous and single-owner. Every operation returns the
//! surface commands to apply, in order. [`crate::runtime::SessionRuntime`]
//! serializes events onto it from an async control loop.

use serde::{Deserialize, Serialize};

use reelsync_common::config::AppConfig;
use reelsync_common::error::{JobFailure, ReelsyncError, ReelsyncResult};
use reelsync_media_model::{FilterMode, MediaRef, OverlayId, OverlaySpec, Position};

use crate::catalog::{EffectCatalog, EffectEntry, NORMAL};
use crate::clock::{Clock, TickOutcome};
use crate::command::{self, SurfaceCommand, VideoCommand};
use crate::jobs::{Completion, JobSeq, TransformJobManager, TransformRequest};
use crate::scheduler::{OverlayScheduler, VisibleOverlay};
use crate::sync::{SyncController, SyncPhase};

/// Optional components attached to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionFeatures {
    pub secondary_audio: bool,
    pub overlays: bool,
    pub filter_mode: FilterMode,
}

impl Default for SessionFeatures {
    fn default() -> Self {
        Self::full()
    }
}

impl SessionFeatures {
    /// Everything attached, baked filters.
    pub fn full() -> Self {
        Self {
            secondary_audio: true,
            overlays: true,
            filter_mode: FilterMode::Baked,
        }
    }

    /// Trim and baked filters only.
    pub fn filters() -> Self {
        Self {
            secondary_audio: false,
            overlays: false,
            filter_mode: FilterMode::Baked,
        }
    }

    /// Trim, filters and a secondary audio track.
    pub fn audio() -> Self {
        Self {
            secondary_audio: true,
            ..Self::filters()
        }
    }

    /// Trim, filters and text/image overlays.
    pub fn overlays() -> Self {
        Self {
            overlays: true,
            ..Self::filters()
        }
    }

    /// Trim and live shader filters.
    pub fn live_filters() -> Self {
        Self {
            filter_mode: FilterMode::Live,
            ..Self::filters()
        }
    }
}

/// Input to [`EditorSession::handle`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    LoadSource { media: MediaRef },
    SourceReady { duration: f64 },
    AttachAudio { media: MediaRef, duration: f64 },
    DetachAudio,
    VideoProgress { position: f64 },
    AudioProgress { position: f64 },
    Seek { position: f64 },
    SetTrim { start: f64, end: f64 },
    SetAudioTrim { start: f64, end: f64 },
    SetRate { rate: f64 },
    Play,
    Pause,
    SelectEffect { name: String },
    NextEffect,
    PreviousEffect,
    AddOverlay { overlay: OverlaySpec },
    DragOverlay { id: OverlayId, x: f64, y: f64 },
    DragOverlayBy { id: OverlayId, dx: f64, dy: f64 },
    #[serde(skip_deserializing)]
    JobCompleted {
        seq: JobSeq,
        result: Result<MediaRef, JobFailure>,
    },
}

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum SessionNotice {
    JobSubmitted { seq: JobSeq, effect: String },
    JobSuperseded { seq: JobSeq },
    JobApplied { seq: JobSeq, media: MediaRef, resume_position: f64 },
    JobDiscarded { seq: JobSeq },
    OverlayAdded { id: OverlayId },
    Error { message: String },
}

/// Point-in-time view of the session for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub source: Option<MediaRef>,
    pub loading: Option<MediaRef>,
    pub active_media: Option<MediaRef>,
    pub audio: Option<MediaRef>,
    pub ready: bool,
    pub position: f64,
    pub trim_start: f64,
    pub trim_end: f64,
    pub rate: f64,
    pub playing: bool,
    pub sync_phase: SyncPhase,
    pub audio_position: Option<f64>,
    pub selected_effect: &'static str,
    pub job_state: &'static str,
    pub latest_job: JobSeq,
    pub overlay_count: usize,
}

/// Editing session for one source video.
#[derive(Debug, Clone)]
pub struct EditorSession {
    config: AppConfig,
    features: SessionFeatures,
    catalog: EffectCatalog,
    sync: SyncController,
    overlays: Option<OverlayScheduler>,
    jobs: TransformJobManager,
    selected_effect: &'static str,
    source: Option<MediaRef>,
    /// Source handed to the surface but not yet reported ready.
    loading: Option<MediaRef>,
    audio: Option<MediaRef>,
    notices: Vec<SessionNotice>,
}

impl EditorSession {
    pub fn new(config: AppConfig, features: SessionFeatures) -> Self {
        let overlays = features.overlays.then(|| {
            OverlayScheduler::new(config.overlays.clone(), config.animation.clone())
        });
        Self {
            sync: SyncController::new(config.sync.drift_tolerance_secs),
            config,
            features,
            catalog: EffectCatalog::builtin(),
            overlays,
            jobs: TransformJobManager::new(),
            selected_effect: NORMAL,
            source: None,
            loading: None,
            audio: None,
            notices: Vec::new(),
        }
    }

    /// Dispatch one event.
    pub fn handle(&mut self, event: SessionEvent) -> ReelsyncResult<Vec<SurfaceCommand>> {
        match event {
            SessionEvent::LoadSource { media } => Ok(self.load_source(media)),
            SessionEvent::SourceReady { duration } => self.on_source_ready(duration),
            SessionEvent::AttachAudio { media, duration } => self.attach_audio(media, duration),
            SessionEvent::DetachAudio => Ok(self.detach_audio()),
            SessionEvent::VideoProgress { position } => Ok(self.on_video_progress(position)),
            SessionEvent::AudioProgress { position } => {
                self.on_audio_progress(position);
                Ok(vec![])
            }
            SessionEvent::Seek { position } => Ok(self.seek(position)),
            SessionEvent::SetTrim { start, end } => self.set_trim(start, end),
            SessionEvent::SetAudioTrim { start, end } => self.set_audio_trim(start, end),
            SessionEvent::SetRate { rate } => self.set_rate(rate),
            SessionEvent::Play => Ok(self.play()),
            SessionEvent::Pause => Ok(self.pause()),
            SessionEvent::SelectEffect { name } => self.select_effect(&name),
            SessionEvent::NextEffect => self.next_effect(),
            SessionEvent::PreviousEffect => self.previous_effect(),
            SessionEvent::AddOverlay { overlay } => {
                self.add_overlay(overlay)?;
                Ok(vec![])
            }
            SessionEvent::DragOverlay { id, x, y } => {
                self.drag_overlay(id, Position::new(x, y))?;
                Ok(vec![])
            }
            SessionEvent::DragOverlayBy { id, dx, dy } => {
                self.drag_overlay_by(id, dx, dy)?;
                Ok(vec![])
            }
            SessionEvent::JobCompleted { seq, result } => self.on_job_completed(seq, result),
        }
    }

    // --- media lifecycle ---

    /// Ask the surface to load a new source.
    ///
    /// Nothing changes until the surface reports the source ready; a failed
    /// load leaves the current source, clock and media in place.
    pub fn load_source(&mut self, media: MediaRef) -> Vec<SurfaceCommand> {
        tracing::info!(media = %media, "Loading source");
        self.loading = Some(media.clone());
        vec![VideoCommand::Load { media }.into()]
    }

    /// The primary surface reported the loading source's duration.
    ///
    /// Commits the source with a fresh clock and starts playback.
    pub fn on_source_ready(&mut self, duration: f64) -> ReelsyncResult<Vec<SurfaceCommand>> {
        let media = self
            .loading
            .take()
            .ok_or_else(|| ReelsyncError::unsupported("no source loading"))?;

        let clock = Clock::ready(duration, self.config.playback.default_trim_secs)
            .map_err(|e| ReelsyncError::load(media.as_str(), e.to_string()))?;

        let mut commands: Vec<SurfaceCommand> =
            command::audio(self.sync.replace_primary(clock)).collect();

        if let Some(seq) = self.jobs.set_source(media.clone()) {
            self.notices.push(SessionNotice::JobSuperseded { seq });
        }
        if let Some(overlays) = self.overlays.as_mut() {
            overlays.reset_pass();
        }
        self.source = Some(media);

        let was_filtered = self.selected_effect != NORMAL;
        self.selected_effect = NORMAL;
        if was_filtered && self.features.filter_mode == FilterMode::Live {
            commands.push(SurfaceCommand::Shader { amount: 1.0 });
        }

        let primary = self.sync.primary();
        tracing::info!(
            duration,
            trim_end = primary.trim_end(),
            "Source ready, starting playback"
        );

        commands.push(
            VideoCommand::SetRate {
                rate: primary.rate(),
            }
            .into(),
        );
        commands.push(VideoCommand::Play.into());
        commands.extend(command::audio(self.sync.play()));
        self.observe_overlays();
        Ok(commands)
    }

    /// A surface finished loading `media`.
    ///
    /// The loading source is committed; filtered renditions keep the existing
    /// clock.
    pub fn on_media_loaded(
        &mut self,
        media: &MediaRef,
        duration: f64,
    ) -> ReelsyncResult<Vec<SurfaceCommand>> {
        if self.loading.as_ref() == Some(media) {
            return self.on_source_ready(duration);
        }
        tracing::debug!(media = %media, duration, "Rendition loaded");
        self.jobs.result_loaded(media);
        Ok(vec![])
    }

    /// A surface failed to load `media`.
    ///
    /// A failed source load is forgotten. A failed transform result is
    /// replaced by the media that was active before it.
    pub fn on_media_load_failed(&mut self, media: &MediaRef, error: &ReelsyncError) {
        if self.loading.as_ref() == Some(media) {
            tracing::warn!(media = %media, %error, "Source failed to load, keeping current source");
            self.loading = None;
            return;
        }
        let reason = JobFailure::ExecutionFailed(error.to_string());
        if self.jobs.revert_result(media, reason).is_none() {
            tracing::warn!(media = %media, %error, "Media failed to load");
        }
    }

    /// Attach a secondary audio track whose duration is known.
    pub fn attach_audio(
        &mut self,
        media: MediaRef,
        duration: f64,
    ) -> ReelsyncResult<Vec<SurfaceCommand>> {
        if !self.features.secondary_audio {
            return Err(ReelsyncError::unsupported(
                "secondary audio is not enabled for this session",
            ));
        }
        let clock = Clock::ready(duration, self.config.playback.default_trim_secs)
            .map_err(|e| ReelsyncError::load(media.as_str(), e.to_string()))?;
        let audio = self.sync.attach_secondary(clock)?;

        tracing::info!(media = %media, duration, "Secondary audio attached");
        self.audio = Some(media);

        let mut commands = vec![VideoCommand::SetMuted { muted: true }.into()];
        commands.extend(command::audio(audio));
        Ok(commands)
    }

    pub fn detach_audio(&mut self) -> Vec<SurfaceCommand> {
        if self.audio.take().is_none() {
            return vec![];
        }
        let mut commands: Vec<SurfaceCommand> =
            command::audio(self.sync.detach_secondary()).collect();
        commands.push(VideoCommand::SetMuted { muted: false }.into());
        commands
    }

    // --- progress ---

    /// Primary surface progress notification.
    pub fn on_video_progress(&mut self, position: f64) -> Vec<SurfaceCommand> {
        let step = self.sync.on_primary_tick(position);
        let mut commands = Vec::new();

        match step.outcome {
            TickOutcome::NotReady => {
                tracing::debug!(position, "Progress before source ready, ignoring");
                return commands;
            }
            TickOutcome::Looped => {
                let start = self.sync.primary().trim_start();
                tracing::debug!(position = start, "Looping to trim start");
                commands.push(VideoCommand::Seek { position: start }.into());
                if let Some(overlays) = self.overlays.as_mut() {
                    overlays.reset_pass();
                }
            }
            TickOutcome::Advanced => {}
        }

        commands.extend(command::audio(step.commands));
        self.observe_overlays();
        commands
    }

    /// Secondary surface progress notification.
    pub fn on_audio_progress(&mut self, position: f64) {
        self.sync.on_secondary_progress(position);
    }

    // --- user input ---

    pub fn seek(&mut self, position: f64) -> Vec<SurfaceCommand> {
        if !self.sync.primary().is_ready() {
            tracing::debug!(position, "Seek before source ready, ignoring");
            return vec![];
        }
        let (position, audio) = self.sync.seek_primary(position);
        let mut commands = vec![VideoCommand::Seek { position }.into()];
        commands.extend(command::audio(audio));
        self.observe_overlays();
        commands
    }

    pub fn set_trim(&mut self, start: f64, end: f64) -> ReelsyncResult<Vec<SurfaceCommand>> {
        let before = self.sync.primary().position();
        let audio = self.sync.set_primary_trim(start, end)?;
        let after = self.sync.primary().position();

        let mut commands = Vec::new();
        if after != before {
            commands.push(VideoCommand::Seek { position: after }.into());
        }
        commands.extend(command::audio(audio));
        self.observe_overlays();
        Ok(commands)
    }

    pub fn set_audio_trim(&mut self, start: f64, end: f64) -> ReelsyncResult<Vec<SurfaceCommand>> {
        let audio = self.sync.set_secondary_trim(start, end)?;
        Ok(command::audio(audio).collect())
    }

    pub fn set_rate(&mut self, rate: f64) -> ReelsyncResult<Vec<SurfaceCommand>> {
        self.sync.set_primary_rate(rate)?;
        Ok(vec![VideoCommand::SetRate { rate }.into()])
    }

    pub fn play(&mut self) -> Vec<SurfaceCommand> {
        let mut commands = vec![VideoCommand::Play.into()];
        commands.extend(command::audio(self.sync.play()));
        commands
    }

    pub fn pause(&mut self) -> Vec<SurfaceCommand> {
        let mut commands = vec![VideoCommand::Pause.into()];
        commands.extend(command::audio(self.sync.pause()));
        commands
    }

    // --- effects ---

    /// Select an effect by name.
    ///
    /// Live sessions get a shader command. Baked sessions submit a transform
    /// job; selecting the identity effect cancels any running job and keeps
    /// the active media.
    pub fn select_effect(&mut self, name: &str) -> ReelsyncResult<Vec<SurfaceCommand>> {
        let entry = self.catalog.lookup(name)?.clone();
        match self.features.filter_mode {
            FilterMode::Live => self.apply_live(&entry),
            FilterMode::Baked => self.submit_baked(entry),
        }
    }

    /// Swipe to the next effect.
    pub fn next_effect(&mut self) -> ReelsyncResult<Vec<SurfaceCommand>> {
        let name = self
            .catalog
            .next_after(self.selected_effect, self.features.filter_mode)?
            .name;
        self.select_effect(name)
    }

    /// Swipe to the previous effect.
    pub fn previous_effect(&mut self) -> ReelsyncResult<Vec<SurfaceCommand>> {
        let name = self
            .catalog
            .previous_before(self.selected_effect, self.features.filter_mode)?
            .name;
        self.select_effect(name)
    }

    /// Executor finished job `seq`.
    pub fn on_job_completed(
        &mut self,
        seq: JobSeq,
        result: Result<MediaRef, JobFailure>,
    ) -> ReelsyncResult<Vec<SurfaceCommand>> {
        match self.jobs.complete(seq, result) {
            Completion::Applied {
                seq,
                media,
                resume_position,
            } => {
                let (position, audio) = self.sync.seek_primary(resume_position);
                let mut commands = vec![
                    VideoCommand::Load {
                        media: media.clone(),
                    }
                    .into(),
                    VideoCommand::Seek { position }.into(),
                ];
                if self.sync.primary().is_playing() {
                    commands.push(VideoCommand::Play.into());
                }
                commands.extend(command::audio(audio));
                self.observe_overlays();
                self.notices.push(SessionNotice::JobApplied {
                    seq,
                    media,
                    resume_position: position,
                });
                Ok(commands)
            }
            Completion::Failed { reason, .. } => Err(reason.into()),
            Completion::Discarded { seq } => {
                self.notices.push(SessionNotice::JobDiscarded { seq });
                Ok(vec![])
            }
        }
    }

    // --- overlays ---

    pub fn add_overlay(&mut self, spec: OverlaySpec) -> ReelsyncResult<OverlayId> {
        let id = self.scheduler_mut()?.add(spec)?;
        self.observe_overlays();
        self.notices.push(SessionNotice::OverlayAdded { id });
        Ok(id)
    }

    pub fn drag_overlay(&mut self, id: OverlayId, position: Position) -> ReelsyncResult<()> {
        self.scheduler_mut()?.drag_to(id, position)
    }

    pub fn drag_overlay_by(&mut self, id: OverlayId, dx: f64, dy: f64) -> ReelsyncResult<Position> {
        self.scheduler_mut()?.drag_by(id, dx, dy)
    }

    /// Overlays visible at the current primary position.
    pub fn visible_overlays(&self) -> impl Iterator<Item = VisibleOverlay<'_>> + '_ {
        let t = self.sync.primary().position();
        self.overlays
            .iter()
            .flat_map(move |scheduler| scheduler.visible_overlays(t))
    }

    // --- accessors ---

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn features(&self) -> SessionFeatures {
        self.features
    }

    pub fn catalog(&self) -> &EffectCatalog {
        &self.catalog
    }

    pub fn sync(&self) -> &SyncController {
        &self.sync
    }

    pub fn primary(&self) -> &Clock {
        self.sync.primary()
    }

    pub fn overlays(&self) -> Option<&OverlayScheduler> {
        self.overlays.as_ref()
    }

    pub fn jobs(&self) -> &TransformJobManager {
        &self.jobs
    }

    pub fn selected_effect(&self) -> &'static str {
        self.selected_effect
    }

    pub fn loading(&self) -> Option<&MediaRef> {
        self.loading.as_ref()
    }

    pub fn source(&self) -> Option<&MediaRef> {
        self.source.as_ref()
    }

    /// Media the primary surface should be showing.
    pub fn active_media(&self) -> Option<&MediaRef> {
        self.jobs.active_media()
    }

    pub fn audio(&self) -> Option<&MediaRef> {
        self.audio.as_ref()
    }

    pub fn drain_notices(&mut self) -> Vec<SessionNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let primary = self.sync.primary();
        SessionSnapshot {
            source: self.source.clone(),
            loading: self.loading.clone(),
            active_media: self.jobs.active_media().cloned(),
            audio: self.audio.clone(),
            ready: primary.is_ready(),
            position: primary.position(),
            trim_start: primary.trim_start(),
            trim_end: primary.trim_end(),
            rate: primary.rate(),
            playing: primary.is_playing(),
            sync_phase: self.sync.phase(),
            audio_position: self.sync.secondary().map(Clock::position),
            selected_effect: self.selected_effect,
            job_state: self.jobs.state().label(),
            latest_job: self.jobs.latest_seq(),
            overlay_count: self.overlays.as_ref().map_or(0, OverlayScheduler::len),
        }
    }

    fn apply_live(&mut self, entry: &EffectEntry) -> ReelsyncResult<Vec<SurfaceCommand>> {
        let amount = entry.shader_amount.ok_or_else(|| {
            ReelsyncError::unsupported(format!("{} has no live shader variant", entry.name))
        })?;
        tracing::info!(effect = entry.name, amount, "Live filter selected");
        self.selected_effect = entry.name;
        Ok(vec![SurfaceCommand::Shader { amount }])
    }

    fn submit_baked(&mut self, entry: EffectEntry) -> ReelsyncResult<Vec<SurfaceCommand>> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| ReelsyncError::unsupported("no source loaded"))?;

        let primary = self.sync.primary();
        let resume_position = if self.config.playback.resume_after_transform {
            primary.position()
        } else {
            primary.trim_start()
        };

        let outcome = self.jobs.submit(
            TransformRequest {
                effect: entry.name.to_string(),
                source,
                resume_position,
            },
            entry.description,
        );
        self.selected_effect = entry.name;

        if let Some(seq) = outcome.superseded {
            self.notices.push(SessionNotice::JobSuperseded { seq });
        }
        Ok(match outcome.ticket {
            Some(ticket) => {
                self.notices.push(SessionNotice::JobSubmitted {
                    seq: ticket.seq,
                    effect: entry.name.to_string(),
                });
                vec![SurfaceCommand::Transform(ticket)]
            }
            None => vec![],
        })
    }

    fn scheduler_mut(&mut self) -> ReelsyncResult<&mut OverlayScheduler> {
        self.overlays
            .as_mut()
            .ok_or_else(|| ReelsyncError::unsupported("overlays are not enabled for this session"))
    }

    fn observe_overlays(&mut self) {
        let t = self.sync.primary().position();
        if let Some(overlays) = self.overlays.as_mut() {
            overlays.observe(t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::AudioCommand;

    fn ready_session(features: SessionFeatures) -> EditorSession {
        let mut session = EditorSession::new(AppConfig::default(), features);
        session.load_source(MediaRef::new("/videos/clip.mp4"));
        session.on_source_ready(30.0).unwrap();
        session
    }

    #[test]
    fn test_load_and_ready_autoplays() {
        let mut session = EditorSession::new(AppConfig::default(), SessionFeatures::full());
        let commands = session.load_source(MediaRef::new("/videos/clip.mp4"));
        assert_eq!(
            commands,
            vec![SurfaceCommand::Video(VideoCommand::Load {
                media: MediaRef::new("/videos/clip.mp4")
            })]
        );
        assert!(session.active_media().is_none());
        assert_eq!(session.loading().unwrap().as_str(), "/videos/clip.mp4");

        let commands = session.on_source_ready(30.0).unwrap();
        assert_eq!(
            commands,
            vec![
                SurfaceCommand::Video(VideoCommand::SetRate { rate: 1.0 }),
                SurfaceCommand::Video(VideoCommand::Play),
            ]
        );
        assert_eq!(session.primary().trim_end(), 10.0);
        assert!(session.primary().is_playing());
        assert_eq!(session.active_media().unwrap().as_str(), "/videos/clip.mp4");
        assert!(session.loading().is_none());
    }

    #[test]
    fn test_failed_source_load_keeps_current_source() {
        let mut session = ready_session(SessionFeatures::filters());
        session.on_video_progress(4.0);

        let missing = MediaRef::new("/videos/other.missing");
        session.load_source(missing.clone());
        session.on_media_load_failed(&missing, &ReelsyncError::load(missing.as_str(), "not found"));

        assert!(session.loading().is_none());
        assert_eq!(session.source().unwrap().as_str(), "/videos/clip.mp4");
        assert_eq!(session.active_media().unwrap().as_str(), "/videos/clip.mp4");
        assert!(session.primary().is_ready());
        assert_eq!(session.primary().position(), 4.0);
        assert_eq!(session.jobs().latest_seq(), 1);
        assert_eq!(
            session.seek(2.0),
            vec![SurfaceCommand::Video(VideoCommand::Seek { position: 2.0 })]
        );
        assert!(session.on_source_ready(30.0).is_err());
    }

    #[test]
    fn test_ready_without_source_is_rejected() {
        let mut session = EditorSession::new(AppConfig::default(), SessionFeatures::full());
        assert!(session.on_source_ready(10.0).is_err());
    }

    #[test]
    fn test_loop_seeks_video_to_trim_start() {
        let mut session = ready_session(SessionFeatures::filters());
        session.set_trim(2.0, 8.0).unwrap();
        let commands = session.on_video_progress(8.1);
        assert_eq!(
            commands,
            vec![SurfaceCommand::Video(VideoCommand::Seek { position: 2.0 })]
        );
    }

    #[test]
    fn test_set_trim_seeks_only_when_position_moves() {
        let mut session = ready_session(SessionFeatures::filters());
        session.seek(5.0);
        assert!(session.set_trim(1.0, 9.0).unwrap().is_empty());
        assert_eq!(
            session.set_trim(6.0, 9.0).unwrap(),
            vec![SurfaceCommand::Video(VideoCommand::Seek { position: 6.0 })]
        );
        assert!(matches!(
            session.set_trim(9.0, 6.0),
            Err(ReelsyncError::InvalidRange { .. })
        ));
        assert_eq!(session.primary().trim_start(), 6.0);
    }

    #[test]
    fn test_attach_audio_mutes_video_and_starts_track() {
        let mut session = ready_session(SessionFeatures::audio());
        session.seek(4.0);
        let commands = session
            .attach_audio(MediaRef::new("/music/song.mp3"), 120.0)
            .unwrap();
        assert_eq!(
            commands,
            vec![
                SurfaceCommand::Video(VideoCommand::SetMuted { muted: true }),
                SurfaceCommand::Audio(AudioCommand::Seek { position: 4.0 }),
                SurfaceCommand::Audio(AudioCommand::Play),
            ]
        );
        assert_eq!(session.sync().phase(), SyncPhase::Syncing);

        let commands = session.detach_audio();
        assert_eq!(
            commands,
            vec![
                SurfaceCommand::Audio(AudioCommand::Stop),
                SurfaceCommand::Video(VideoCommand::SetMuted { muted: false }),
            ]
        );
        assert!(session.detach_audio().is_empty());
    }

    #[test]
    fn test_audio_requires_feature() {
        let mut session = ready_session(SessionFeatures::filters());
        assert!(matches!(
            session.attach_audio(MediaRef::new("/music/song.mp3"), 60.0),
            Err(ReelsyncError::Unsupported { .. })
        ));
        assert!(matches!(
            session.add_overlay(OverlaySpec::from_whole_seconds(
                reelsync_media_model::OverlayContent::text("hi"),
                0,
                2
            )),
            Err(ReelsyncError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_baked_select_submits_job_and_resumes_on_success() {
        let mut session = ready_session(SessionFeatures::filters());
        session.on_video_progress(6.4);

        let commands = session.select_effect("sepia").unwrap();
        let ticket = match &commands[..] {
            [SurfaceCommand::Transform(ticket)] => ticket.clone(),
            other => panic!("unexpected commands {other:?}"),
        };
        assert_eq!(ticket.request.resume_position, 6.4);
        assert_eq!(session.selected_effect(), "Sepia");

        // Playback keeps going while the job runs.
        session.on_video_progress(7.5);

        let commands = session
            .on_job_completed(ticket.seq, Ok(MediaRef::new("/cache/sepia.mp4")))
            .unwrap();
        assert_eq!(
            commands,
            vec![
                SurfaceCommand::Video(VideoCommand::Load {
                    media: MediaRef::new("/cache/sepia.mp4")
                }),
                SurfaceCommand::Video(VideoCommand::Seek { position: 6.4 }),
                SurfaceCommand::Video(VideoCommand::Play),
            ]
        );
        assert_eq!(session.primary().position(), 6.4);
        assert_eq!(session.active_media().unwrap().as_str(), "/cache/sepia.mp4");
    }

    #[test]
    fn test_rendition_load_keeps_clock() {
        let mut session = ready_session(SessionFeatures::filters());
        session.set_trim(1.0, 5.0).unwrap();
        let commands = session
            .on_media_loaded(&MediaRef::new("/cache/x.mp4"), 29.9)
            .unwrap();
        assert!(commands.is_empty());
        assert_eq!(session.primary().total_duration(), Some(30.0));
        assert_eq!(session.primary().trim_start(), 1.0);
    }

    #[test]
    fn test_unloadable_result_reverts_active_media() {
        let mut session = ready_session(SessionFeatures::filters());
        let seq = match &session.select_effect("Invert").unwrap()[..] {
            [SurfaceCommand::Transform(ticket)] => ticket.seq,
            other => panic!("unexpected commands {other:?}"),
        };
        let result = MediaRef::new("/cache/inv.missing");
        session.on_job_completed(seq, Ok(result.clone())).unwrap();
        assert_eq!(session.active_media(), Some(&result));

        session.on_media_load_failed(&result, &ReelsyncError::load(result.as_str(), "not found"));
        assert_eq!(session.active_media().unwrap().as_str(), "/videos/clip.mp4");
        assert_eq!(session.snapshot().job_state, "failed");
    }

    #[test]
    fn test_failed_job_surfaces_reason() {
        let mut session = ready_session(SessionFeatures::filters());
        let seq = match &session.select_effect("Invert").unwrap()[..] {
            [SurfaceCommand::Transform(ticket)] => ticket.seq,
            other => panic!("unexpected commands {other:?}"),
        };
        let err = session
            .on_job_completed(seq, Err(JobFailure::ExecutionFailed("boom".into())))
            .unwrap_err();
        assert!(matches!(err, ReelsyncError::ExecutionFailed { .. }));
        assert_eq!(session.active_media().unwrap().as_str(), "/videos/clip.mp4");
    }

    #[test]
    fn test_normal_cancels_running_job() {
        let mut session = ready_session(SessionFeatures::filters());
        session.select_effect("Vivid").unwrap();
        assert!(session.jobs().is_running());

        assert!(session.select_effect("Normal").unwrap().is_empty());
        assert!(!session.jobs().is_running());
        assert_eq!(session.selected_effect(), "Normal");
        assert!(session
            .drain_notices()
            .iter()
            .any(|n| matches!(n, SessionNotice::JobSuperseded { .. })));
    }

    #[test]
    fn test_unknown_effect_fails_fast() {
        let mut session = ready_session(SessionFeatures::filters());
        assert!(matches!(
            session.select_effect("Lomo"),
            Err(ReelsyncError::UnknownEffect { .. })
        ));
        assert_eq!(session.selected_effect(), "Normal");
        assert_eq!(session.jobs().latest_seq(), 1);
    }

    #[test]
    fn test_live_mode_emits_shader_amounts() {
        let mut session = ready_session(SessionFeatures::live_filters());
        assert_eq!(
            session.next_effect().unwrap(),
            vec![SurfaceCommand::Shader { amount: 2.0 }]
        );
        assert_eq!(session.selected_effect(), "Vivid");
        assert_eq!(
            session.previous_effect().unwrap(),
            vec![SurfaceCommand::Shader { amount: 1.0 }]
        );
        assert!(matches!(
            session.select_effect("Sepia"),
            Err(ReelsyncError::Unsupported { .. })
        ));
        assert_eq!(session.jobs().latest_seq(), 1);
    }

    #[test]
    fn test_overlays_follow_playback() {
        let mut session = ready_session(SessionFeatures::overlays());
        let id = session
            .add_overlay(OverlaySpec::from_whole_seconds(
                reelsync_media_model::OverlayContent::text("Title"),
                3,
                8,
            ))
            .unwrap();

        session.on_video_progress(2.0);
        assert_eq!(session.visible_overlays().count(), 0);

        session.on_video_progress(3.0);
        session.on_video_progress(3.5);
        let visible: Vec<_> = session.visible_overlays().collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].overlay.id, id);
        assert!((visible[0].phase.opacity - 0.5).abs() < 1e-9);

        session.drag_overlay_by(id, 10.0, 0.0).unwrap();
        assert_eq!(
            session.overlays().unwrap().get(id).unwrap().position,
            Position::new(110.0, 100.0)
        );
    }

    #[test]
    fn test_event_json_round_trip_into_handle() {
        let mut session = EditorSession::new(AppConfig::default(), SessionFeatures::full());
        let events: Vec<SessionEvent> = serde_json::from_str(
            r#"[
                {"type": "load_source", "media": "/videos/clip.mp4"},
                {"type": "source_ready", "duration": 12.0},
                {"type": "add_overlay", "overlay": {
                    "content": {"type": "text", "text": "Hi"},
                    "visible_from": 0.0, "visible_until": 4.0
                }},
                {"type": "video_progress", "position": 1.0},
                {"type": "pause"}
            ]"#,
        )
        .unwrap();
        for event in events {
            session.handle(event).unwrap();
        }
        let snapshot = session.snapshot();
        assert!(snapshot.ready);
        assert!(!snapshot.playing);
        assert_eq!(snapshot.position, 1.0);
        assert_eq!(snapshot.overlay_count, 1);

        assert!(serde_json::from_str::<SessionEvent>(r#"{"type": "job_completed", "seq": 1}"#).is_err());
    }
}
