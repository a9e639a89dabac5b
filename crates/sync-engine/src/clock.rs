//! Playback clock for a single timeline.
//!
//! A [`Clock`] holds position, trim window, rate and play state for one
//! media reference. It has no timers of its own: it only reacts to progress
//! notifications delivered by the media surface that is actually playing.

use reelsync_common::error::{ReelsyncError, ReelsyncResult};
use reelsync_common::time::{approx_eq_secs, clamp_secs, within_window};

/// Result of feeding a progress notification into a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Position moved forward (or was corrected) inside the timeline.
    Advanced,
    /// Position reached the trim end and wrapped to the trim start.
    Looped,
    /// Duration is not known yet; the notification was ignored.
    NotReady,
}

/// Position/trim/rate/play-state value for one playback timeline.
///
/// Invariants once ready: `0 <= trim_start < trim_end <= total_duration`
/// and `0 <= position <= total_duration`.
#[derive(Debug, Clone, PartialEq)]
pub struct Clock {
    position: f64,
    trim_start: f64,
    trim_end: f64,
    rate: f64,
    playing: bool,
    total_duration: Option<f64>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// Create an empty clock for freshly assigned media (duration unknown).
    pub fn new() -> Self {
        Self {
            position: 0.0,
            trim_start: 0.0,
            trim_end: 0.0,
            rate: 1.0,
            playing: false,
            total_duration: None,
        }
    }

    /// Create a clock that is already ready, with the default trim window.
    pub fn ready(total_duration: f64, default_trim_secs: f64) -> ReelsyncResult<Self> {
        let mut clock = Self::new();
        clock.mark_ready(total_duration, default_trim_secs)?;
        Ok(clock)
    }

    /// Fix the total duration reported by the media surface.
    ///
    /// The trim window starts as `[0, min(duration, default_trim_secs)]`.
    /// Reporting the same duration again is a no-op; a different duration
    /// for the same media is rejected.
    pub fn mark_ready(&mut self, total_duration: f64, default_trim_secs: f64) -> ReelsyncResult<()> {
        if !(total_duration.is_finite() && total_duration > 0.0) {
            return Err(ReelsyncError::invalid_range(format!(
                "media duration must be positive, got {total_duration}"
            )));
        }

        match self.total_duration {
            Some(existing) if approx_eq_secs(existing, total_duration) => return Ok(()),
            Some(existing) => {
                return Err(ReelsyncError::invalid_range(format!(
                    "duration already fixed at {existing}s, got {total_duration}s"
                )));
            }
            None => {}
        }

        let window = if default_trim_secs > 0.0 {
            default_trim_secs
        } else {
            total_duration
        };

        self.total_duration = Some(total_duration);
        self.trim_start = 0.0;
        self.trim_end = total_duration.min(window);
        self.position = clamp_secs(self.position, 0.0, self.trim_end);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.total_duration.is_some()
    }

    /// Restrict playback to `[start, end]`, clamping the position into it.
    pub fn set_trim(&mut self, start: f64, end: f64) -> ReelsyncResult<()> {
        let total = self
            .total_duration
            .ok_or_else(|| ReelsyncError::invalid_range("cannot trim before media is ready"))?;

        if !(start.is_finite() && end.is_finite()) || start < 0.0 {
            return Err(ReelsyncError::invalid_range(format!(
                "trim bounds must be finite and non-negative, got [{start}, {end}]"
            )));
        }
        if start >= end {
            return Err(ReelsyncError::invalid_range(format!(
                "trim start {start} must be before trim end {end}"
            )));
        }
        if end > total {
            return Err(ReelsyncError::invalid_range(format!(
                "trim end {end} exceeds duration {total}"
            )));
        }

        self.trim_start = start;
        self.trim_end = end;
        self.position = clamp_secs(self.position, start, end);
        Ok(())
    }

    /// Move to `position`, clamped into the trim window. No-op before ready.
    ///
    /// Returns the resulting position.
    pub fn seek(&mut self, position: f64) -> f64 {
        if self.is_ready() && !position.is_nan() {
            self.position = clamp_secs(position, self.trim_start, self.trim_end);
        }
        self.position
    }

    /// Apply one progress notification from the media surface.
    pub fn tick(&mut self, observed_position: f64) -> TickOutcome {
        let Some(total) = self.total_duration else {
            return TickOutcome::NotReady;
        };

        if observed_position >= self.trim_end {
            self.position = self.trim_start;
            TickOutcome::Looped
        } else {
            self.position = clamp_secs(observed_position, 0.0, total);
            TickOutcome::Advanced
        }
    }

    /// Record a position reported by a surface without loop handling.
    ///
    /// Used for tracks whose looping is driven by another timeline.
    pub fn observe(&mut self, observed_position: f64) {
        if let Some(total) = self.total_duration {
            if !observed_position.is_nan() {
                self.position = clamp_secs(observed_position, 0.0, total);
            }
        }
    }

    pub fn set_rate(&mut self, rate: f64) -> ReelsyncResult<()> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ReelsyncError::invalid_range(format!(
                "playback rate must be positive, got {rate}"
            )));
        }
        self.rate = rate;
        Ok(())
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn trim_start(&self) -> f64 {
        self.trim_start
    }

    pub fn trim_end(&self) -> f64 {
        self.trim_end
    }

    pub fn trim_len(&self) -> f64 {
        self.trim_end - self.trim_start
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn total_duration(&self) -> Option<f64> {
        self.total_duration
    }

    /// Whether the position lies in `[trim_start, trim_end)`.
    pub fn in_trim_window(&self) -> bool {
        self.is_ready() && within_window(self.position, self.trim_start, self.trim_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ready(duration: f64) -> Clock {
        Clock::ready(duration, 10.0).unwrap()
    }

    #[test]
    fn test_new_clock_is_not_ready() {
        let mut clock = Clock::new();
        assert!(!clock.is_ready());
        assert_eq!(clock.tick(3.0), TickOutcome::NotReady);
        assert_eq!(clock.seek(5.0), 0.0);
        assert!(matches!(
            clock.set_trim(0.0, 1.0),
            Err(ReelsyncError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_default_trim_window() {
        assert_eq!(ready(30.0).trim_end(), 10.0);
        assert_eq!(ready(6.5).trim_end(), 6.5);
        assert_eq!(ready(30.0).trim_start(), 0.0);
    }

    #[test]
    fn test_duration_fixed_once() {
        let mut clock = ready(30.0);
        clock.mark_ready(30.0, 10.0).unwrap();
        assert!(clock.mark_ready(31.0, 10.0).is_err());
        assert_eq!(clock.total_duration(), Some(30.0));
        assert!(Clock::new().mark_ready(0.0, 10.0).is_err());
    }

    #[test]
    fn test_set_trim_rejects_invalid_ranges_and_keeps_state() {
        let mut clock = ready(20.0);
        clock.seek(4.0);
        let before = clock.clone();

        assert!(clock.set_trim(5.0, 5.0).is_err());
        assert!(clock.set_trim(6.0, 5.0).is_err());
        assert!(clock.set_trim(0.0, 20.5).is_err());
        assert!(clock.set_trim(-1.0, 5.0).is_err());
        assert!(clock.set_trim(f64::NAN, 5.0).is_err());
        assert_eq!(clock, before);
    }

    #[test]
    fn test_set_trim_clamps_position() {
        let mut clock = ready(20.0);
        clock.set_trim(0.0, 20.0).unwrap();
        clock.seek(15.0);
        clock.set_trim(2.0, 12.0).unwrap();
        assert_eq!(clock.position(), 12.0);

        clock.seek(3.0);
        clock.set_trim(5.0, 12.0).unwrap();
        assert_eq!(clock.position(), 5.0);
    }

    #[test]
    fn test_tick_loops_at_trim_end() {
        let mut clock = ready(20.0);
        clock.set_trim(2.0, 12.0).unwrap();

        assert_eq!(clock.tick(7.0), TickOutcome::Advanced);
        assert_eq!(clock.position(), 7.0);

        assert_eq!(clock.tick(12.3), TickOutcome::Looped);
        assert_eq!(clock.position(), 2.0);
    }

    #[test]
    fn test_tick_before_trim_start_is_recorded() {
        let mut clock = ready(20.0);
        clock.set_trim(2.0, 12.0).unwrap();
        assert_eq!(clock.tick(1.0), TickOutcome::Advanced);
        assert_eq!(clock.position(), 1.0);
        assert!(!clock.in_trim_window());
    }

    #[test]
    fn test_rate_validation() {
        let mut clock = ready(10.0);
        assert!(clock.set_rate(0.0).is_err());
        assert!(clock.set_rate(-1.0).is_err());
        assert!(clock.set_rate(f64::INFINITY).is_err());
        clock.set_rate(1.5).unwrap();
        assert_eq!(clock.rate(), 1.5);
    }

    #[test]
    fn test_observe_does_not_loop() {
        let mut clock = ready(60.0);
        clock.set_trim(0.0, 10.0).unwrap();
        clock.observe(11.0);
        assert_eq!(clock.position(), 11.0);
        clock.observe(80.0);
        assert_eq!(clock.position(), 60.0);
    }

    proptest! {
        #[test]
        fn prop_seek_to_trim_end_then_tick_loops(
            total in 1.0f64..600.0,
            a in 0.0f64..1.0,
            b in 0.0f64..1.0,
        ) {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            prop_assume!(hi - lo > 1e-6);
            let (start, end) = (lo * total, hi * total);

            let mut clock = Clock::ready(total, total).unwrap();
            clock.set_trim(start, end).unwrap();

            prop_assert_eq!(clock.seek(end), end);
            prop_assert_eq!(clock.tick(end), TickOutcome::Looped);
            prop_assert_eq!(clock.position(), start);
        }

        #[test]
        fn prop_trim_round_trip_restores_state(
            total in 1.0f64..600.0,
            inner_start in 0.0f64..0.4,
            inner_end in 0.6f64..1.0,
            pos in 0.4f64..0.6,
        ) {
            let mut clock = Clock::ready(total, total).unwrap();
            clock.seek(pos * total);
            let original = clock.clone();

            clock.set_trim(inner_start * total, inner_end * total).unwrap();
            clock.set_trim(original.trim_start(), original.trim_end()).unwrap();

            prop_assert_eq!(clock, original);
        }

        #[test]
        fn prop_trim_round_trip_reclamps_consistently(
            total in 1.0f64..600.0,
            pos in 0.0f64..1.0,
        ) {
            let mut clock = Clock::ready(total, total).unwrap();
            clock.seek(pos * total);

            clock.set_trim(0.25 * total, 0.5 * total).unwrap();
            let clamped = clock.position();
            clock.set_trim(0.0, total).unwrap();

            prop_assert_eq!(clock.position(), clamped);
            prop_assert_eq!(clock.trim_start(), 0.0);
            prop_assert_eq!(clock.trim_end(), total);
        }
    }
}
