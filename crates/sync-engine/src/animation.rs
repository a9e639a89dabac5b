//! Overlay animation phases.
//!
//! A phase is a pure function of how long an overlay has been visible in
//! the current playback pass. There are no running animation objects: the
//! renderer asks for the phase on every frame and interpolates toward it.

use serde::Serialize;

use reelsync_common::config::AnimationTimings;
use reelsync_media_model::AnimationKind;

/// Peak scale reached by the text bounce.
pub const BOUNCE_PEAK_SCALE: f64 = 1.5;

/// Peak rotation reached by the image rock, in degrees.
pub const ROTATE_PEAK_DEGREES: f64 = 180.0;

const COLOR_FROM: (u8, u8, u8) = (255, 0, 0);
const COLOR_TO: (u8, u8, u8) = (0, 0, 255);

/// Animated values for one overlay at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnimationPhase {
    /// Seconds since the overlay (re-)entered view.
    pub elapsed_secs: f64,
    /// `[0.0, 1.0]`.
    pub opacity: f64,
    /// `[1.0, BOUNCE_PEAK_SCALE]`.
    pub scale: f64,
    /// Color cycle position, `0.0` = red, `1.0` = blue.
    pub color_mix: f64,
    /// `[0.0, ROTATE_PEAK_DEGREES]`.
    pub rotation_degrees: f64,
}

impl AnimationPhase {
    /// Values for an overlay with no animation.
    pub fn resting(elapsed_secs: f64) -> Self {
        Self {
            elapsed_secs,
            opacity: 1.0,
            scale: 1.0,
            color_mix: 0.0,
            rotation_degrees: 0.0,
        }
    }

    /// Combine the given animations at `elapsed_secs` of visible time.
    pub fn at(kinds: &[AnimationKind], elapsed_secs: f64, timings: &AnimationTimings) -> Self {
        let elapsed = elapsed_secs.max(0.0);
        let mut phase = Self::resting(elapsed);

        for kind in kinds {
            match kind {
                AnimationKind::None => {}
                AnimationKind::FadeIn => {
                    phase.opacity = (elapsed / timings.fade_in_secs).clamp(0.0, 1.0);
                }
                AnimationKind::BounceColor => {
                    phase.scale = 1.0
                        + (BOUNCE_PEAK_SCALE - 1.0)
                            * triangle_wave(elapsed, timings.bounce_period_secs);
                    phase.color_mix = triangle_wave(elapsed, timings.color_period_secs);
                }
                AnimationKind::RotateLoop => {
                    phase.rotation_degrees =
                        ROTATE_PEAK_DEGREES * triangle_wave(elapsed, timings.rotate_period_secs);
                }
            }
        }

        phase
    }

    /// Text color for the current color-cycle position.
    pub fn text_color_rgb(&self) -> (u8, u8, u8) {
        let lerp = |a: u8, b: u8| -> u8 {
            (a as f64 + (b as f64 - a as f64) * self.color_mix).round() as u8
        };
        (
            lerp(COLOR_FROM.0, COLOR_TO.0),
            lerp(COLOR_FROM.1, COLOR_TO.1),
            lerp(COLOR_FROM.2, COLOR_TO.2),
        )
    }
}

/// 0 at the start of each cycle, 1 at half period, back to 0 at full period.
pub fn triangle_wave(elapsed_secs: f64, period_secs: f64) -> f64 {
    if period_secs <= 0.0 {
        return 0.0;
    }
    let f = (elapsed_secs / period_secs).rem_euclid(1.0);
    if f < 0.5 {
        f * 2.0
    } else {
        2.0 - f * 2.0
    }
}
