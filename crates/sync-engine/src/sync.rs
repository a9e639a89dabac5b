//! Audio/video synchronization.
//!
//! The primary (video) and secondary (audio) tracks are played by two
//! independently clocked surfaces that expose no shared time base. The
//! [`SyncController`] is therefore a reconciliation loop: on every primary
//! progress notification it computes where the secondary *should* be and
//! issues pause/seek/play corrections when it is not.
//!
//! # Mapping
//!
//! ```text
//! audio_target = secondary.trim_start + (primary.position - primary.trim_start)
//! ```
//!
//! defined only while the primary position lies in its trim window. The two
//! windows may have different lengths; once the target leaves the secondary
//! window the secondary is paused until the target re-enters it.

use serde::Serialize;

use reelsync_common::error::{ReelsyncError, ReelsyncResult};
use reelsync_common::time::{within_window, DriftMeasurement};

use crate::clock::{Clock, TickOutcome};
use crate::command::AudioCommand;

/// Synchronization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// No secondary track attached.
    Unsynced,
    /// Secondary is following the primary within tolerance.
    Syncing,
    /// Secondary has been paused because it left tolerance or its window.
    Drifted,
}

/// Result of one primary progress notification.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStep {
    pub outcome: TickOutcome,
    pub commands: Vec<AudioCommand>,
}

/// Owns the primary clock and the optional secondary clock.
#[derive(Debug, Clone)]
pub struct SyncController {
    primary: Clock,
    secondary: Option<Clock>,
    phase: SyncPhase,
    tolerance_secs: f64,
}

impl SyncController {
    pub fn new(tolerance_secs: f64) -> Self {
        Self {
            primary: Clock::new(),
            secondary: None,
            phase: SyncPhase::Unsynced,
            tolerance_secs: tolerance_secs.max(0.0),
        }
    }

    pub fn primary(&self) -> &Clock {
        &self.primary
    }

    pub fn secondary(&self) -> Option<&Clock> {
        self.secondary.as_ref()
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn tolerance_secs(&self) -> f64 {
        self.tolerance_secs
    }

    /// Where the secondary should be for the current primary position.
    ///
    /// `None` without a secondary, before the primary is ready, or while the
    /// primary position is outside its trim window.
    pub fn audio_target(&self) -> Option<f64> {
        let secondary = self.secondary.as_ref()?;
        if !self.primary.in_trim_window() {
            return None;
        }
        Some(secondary.trim_start() + (self.primary.position() - self.primary.trim_start()))
    }

    /// Replace the primary clock (new source media). Pauses the secondary.
    pub fn replace_primary(&mut self, clock: Clock) -> Vec<AudioCommand> {
        self.primary = clock;
        self.pause_secondary_into(SyncPhase::Drifted)
    }

    /// Fix the primary duration and bring the secondary in line.
    pub fn mark_primary_ready(
        &mut self,
        total_duration: f64,
        default_trim_secs: f64,
    ) -> ReelsyncResult<Vec<AudioCommand>> {
        self.primary.mark_ready(total_duration, default_trim_secs)?;
        Ok(self.resync())
    }

    /// Attach a ready secondary clock, replacing any previous one.
    ///
    /// The secondary starts only once the primary is ready too.
    pub fn attach_secondary(&mut self, clock: Clock) -> ReelsyncResult<Vec<AudioCommand>> {
        if !clock.is_ready() {
            return Err(ReelsyncError::invalid_range(
                "secondary track must report its duration before attaching",
            ));
        }

        let mut commands = Vec::new();
        if self.secondary.as_ref().is_some_and(Clock::is_playing) {
            commands.push(AudioCommand::Stop);
        }

        let mut clock = clock;
        clock.pause();
        self.secondary = Some(clock);
        self.phase = SyncPhase::Drifted;
        tracing::info!(
            trim_end = self.secondary.as_ref().map(Clock::trim_end),
            "Secondary track attached"
        );

        commands.extend(self.resync());
        Ok(commands)
    }

    /// Remove the secondary track.
    pub fn detach_secondary(&mut self) -> Vec<AudioCommand> {
        let commands = match self.secondary.take() {
            Some(_) => vec![AudioCommand::Stop],
            None => vec![],
        };
        self.phase = SyncPhase::Unsynced;
        commands
    }

    /// Apply a primary progress notification and reconcile the secondary.
    pub fn on_primary_tick(&mut self, observed_position: f64) -> SyncStep {
        let before = self.primary.position();
        let outcome = self.primary.tick(observed_position);

        let commands = match outcome {
            TickOutcome::NotReady => vec![],
            TickOutcome::Looped => self.restart_secondary(),
            TickOutcome::Advanced => {
                self.extrapolate_secondary(self.primary.position() - before);
                self.reconcile()
            }
        };

        SyncStep { outcome, commands }
    }

    /// Record a progress notification from the secondary surface.
    pub fn on_secondary_progress(&mut self, observed_position: f64) {
        if let Some(secondary) = self.secondary.as_mut() {
            secondary.observe(observed_position);
        }
    }

    /// User seek on the primary timeline. Returns the clamped position.
    pub fn seek_primary(&mut self, position: f64) -> (f64, Vec<AudioCommand>) {
        let position = self.primary.seek(position);
        (position, self.resync())
    }

    pub fn set_primary_trim(&mut self, start: f64, end: f64) -> ReelsyncResult<Vec<AudioCommand>> {
        self.primary.set_trim(start, end)?;
        Ok(self.resync())
    }

    pub fn set_secondary_trim(
        &mut self,
        start: f64,
        end: f64,
    ) -> ReelsyncResult<Vec<AudioCommand>> {
        let secondary = self
            .secondary
            .as_mut()
            .ok_or_else(|| ReelsyncError::unsupported("no secondary track attached"))?;
        secondary.set_trim(start, end)?;
        Ok(self.resync())
    }

    pub fn set_primary_rate(&mut self, rate: f64) -> ReelsyncResult<()> {
        self.primary.set_rate(rate)
    }

    pub fn play(&mut self) -> Vec<AudioCommand> {
        self.primary.play();
        self.resync()
    }

    pub fn pause(&mut self) -> Vec<AudioCommand> {
        self.primary.pause();
        match self.secondary.as_mut() {
            Some(secondary) if secondary.is_playing() => {
                secondary.pause();
                vec![AudioCommand::Pause]
            }
            _ => vec![],
        }
    }

    /// Hard resynchronization: seek the secondary to the audio target, or
    /// pause it when the target is undefined or outside its window.
    pub fn resync(&mut self) -> Vec<AudioCommand> {
        if self.secondary.is_none() {
            self.phase = SyncPhase::Unsynced;
            return vec![];
        }

        match self.target_in_window() {
            Some(target) => {
                let primary_playing = self.primary.is_playing();
                let Some(secondary) = self.secondary.as_mut() else {
                    return vec![];
                };
                let mut commands = vec![AudioCommand::Seek {
                    position: secondary.seek(target),
                }];
                if primary_playing && !secondary.is_playing() {
                    secondary.play();
                    commands.push(AudioCommand::Play);
                } else if !primary_playing && secondary.is_playing() {
                    secondary.pause();
                    commands.push(AudioCommand::Pause);
                }
                self.phase = SyncPhase::Syncing;
                commands
            }
            None => self.pause_secondary_into(SyncPhase::Drifted),
        }
    }

    /// Audio target, if it lies inside the secondary trim window.
    fn target_in_window(&self) -> Option<f64> {
        let secondary = self.secondary.as_ref()?;
        if !secondary.is_ready() {
            return None;
        }
        self.audio_target()
            .filter(|t| within_window(*t, secondary.trim_start(), secondary.trim_end()))
    }

    /// Primary looped: restart the secondary from its own trim start.
    fn restart_secondary(&mut self) -> Vec<AudioCommand> {
        let Some(secondary) = self.secondary.as_mut() else {
            return vec![];
        };
        let start = secondary.trim_start();
        secondary.seek(start);
        secondary.play();
        self.phase = SyncPhase::Syncing;
        tracing::debug!(position = start, "Primary looped, restarting secondary");
        vec![
            AudioCommand::Stop,
            AudioCommand::Seek { position: start },
            AudioCommand::Play,
        ]
    }

    /// Advance the secondary estimate by the wall time the primary covered.
    ///
    /// Secondary progress notifications overwrite the estimate when present.
    fn extrapolate_secondary(&mut self, primary_delta: f64) {
        if self.phase != SyncPhase::Syncing || primary_delta <= 0.0 {
            return;
        }
        let wall_secs = primary_delta / self.primary.rate();
        if let Some(secondary) = self.secondary.as_mut() {
            if secondary.is_playing() {
                let next = secondary.position() + wall_secs * secondary.rate();
                secondary.observe(next);
            }
        }
    }

    /// Per-tick drift check.
    fn reconcile(&mut self) -> Vec<AudioCommand> {
        match self.phase {
            SyncPhase::Unsynced => vec![],
            SyncPhase::Syncing => {
                let Some(target) = self.target_in_window() else {
                    tracing::debug!("Audio target left the secondary window");
                    return self.pause_secondary_into(SyncPhase::Drifted);
                };
                let Some(secondary) = self.secondary.as_ref() else {
                    return vec![];
                };
                let drift = DriftMeasurement::new(target, secondary.position());
                if drift.exceeds(self.tolerance_secs) {
                    tracing::debug!(
                        drift_ms = drift.drift_ms(),
                        tolerance_secs = self.tolerance_secs,
                        "Secondary drifted"
                    );
                    self.phase = SyncPhase::Drifted;
                    if let Some(secondary) = self.secondary.as_mut() {
                        secondary.pause();
                    }
                    vec![AudioCommand::Pause]
                } else {
                    vec![]
                }
            }
            SyncPhase::Drifted => {
                if self.target_in_window().is_some() {
                    tracing::debug!("Audio target back in window, resuming secondary");
                    self.resync()
                } else {
                    vec![]
                }
            }
        }
    }

    fn pause_secondary_into(&mut self, phase: SyncPhase) -> Vec<AudioCommand> {
        let Some(secondary) = self.secondary.as_mut() else {
            self.phase = SyncPhase::Unsynced;
            return vec![];
        };
        self.phase = phase;
        if secondary.is_playing() {
            secondary.pause();
            vec![AudioCommand::Pause]
        } else {
            vec![]
        }
    }
}
