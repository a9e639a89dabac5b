//! Media-time utilities for track synchronization.
//!
//! All Reelsync timeline values are media seconds (`f64`) measured from the
//! start of the media reference they belong to. This module provides:
//! - Half-open window membership checks
//! - Drift measurement between a reference and a measured track
//! - Display formatting for positions

/// Positions closer than this are considered equal.
pub const TIME_EPSILON_SECS: f64 = 1e-9;

/// Whether `t` lies in the half-open window `[start, end)`.
pub fn within_window(t: f64, start: f64, end: f64) -> bool {
    t >= start && t < end
}

/// Clamp `t` into the closed range `[start, end]`.
pub fn clamp_secs(t: f64, start: f64, end: f64) -> f64 {
    t.max(start).min(end)
}

/// Compare two media positions with [`TIME_EPSILON_SECS`] tolerance.
pub fn approx_eq_secs(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_EPSILON_SECS
}

/// Drift measurement between two tracks, in media seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftMeasurement {
    /// Where the measured track should be.
    pub expected_secs: f64,
    /// Where the measured track is.
    pub measured_secs: f64,
}

impl DriftMeasurement {
    pub fn new(expected_secs: f64, measured_secs: f64) -> Self {
        Self {
            expected_secs,
            measured_secs,
        }
    }

    /// Drift in seconds (positive = measured is ahead).
    pub fn drift_secs(&self) -> f64 {
        self.measured_secs - self.expected_secs
    }

    /// Drift in milliseconds.
    pub fn drift_ms(&self) -> f64 {
        self.drift_secs() * 1000.0
    }

    /// Whether drift exceeds the tolerance in either direction.
    pub fn exceeds(&self, tolerance_secs: f64) -> bool {
        self.drift_secs().abs() > tolerance_secs
    }
}

/// Format a media position as `mm:ss.cc`.
pub fn format_position(secs: f64) -> String {
    let secs = secs.max(0.0);
    let minutes = (secs / 60.0).floor() as u64;
    let rem = secs - minutes as f64 * 60.0;
    format!("{minutes:02}:{rem:05.2}")
}
