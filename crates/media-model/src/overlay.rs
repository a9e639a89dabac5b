//! Overlay descriptors: time-windowed, draggable text and image elements.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::media::MediaRef;

/// Session-stable overlay identifier, assigned in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayId(pub u64);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position on the render surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Offset by a drag translation.
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// What an overlay shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayContent {
    Text { text: String },
    Image { source: MediaRef },
}

impl OverlayContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(source: impl Into<MediaRef>) -> Self {
        Self::Image {
            source: source.into(),
        }
    }

    /// Short label for logs and listings.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
        }
    }

    /// Animations applied to this content type.
    ///
    /// Fixed per type: text fades in then bounces while cycling color,
    /// images fade in then rock back and forth.
    pub fn animations(&self) -> [AnimationKind; 2] {
        match self {
            Self::Text { .. } => [AnimationKind::FadeIn, AnimationKind::BounceColor],
            Self::Image { .. } => [AnimationKind::FadeIn, AnimationKind::RotateLoop],
        }
    }
}

/// Animation families the renderer knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationKind {
    /// Static.
    None,
    /// Opacity ramp on entrance.
    FadeIn,
    /// Scale bounce with a color cycle, looping.
    BounceColor,
    /// Rotation back and forth, looping.
    RotateLoop,
}

/// Caller input for a new overlay, before validation and id assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySpec {
    pub content: OverlayContent,

    /// First visible instant (inclusive).
    pub visible_from: f64,

    /// First invisible instant (exclusive).
    pub visible_until: f64,

    /// Font size or pixel dimension; defaults per content type.
    #[serde(default)]
    pub size: Option<f64>,

    /// Drop position; defaults per content type.
    #[serde(default)]
    pub position: Option<Position>,
}

impl OverlaySpec {
    /// Build a spec from whole-second start/end inputs.
    pub fn from_whole_seconds(content: OverlayContent, start_secs: u32, end_secs: u32) -> Self {
        Self {
            content,
            visible_from: f64::from(start_secs),
            visible_until: f64::from(end_secs),
            size: None,
            position: None,
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

/// A validated overlay held by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub id: OverlayId,
    pub content: OverlayContent,
    pub visible_from: f64,
    pub visible_until: f64,
    /// Changed only by drag events.
    pub position: Position,
    pub size: f64,
}

impl Overlay {
    /// Whether the overlay is visible at `t` (half-open window).
    pub fn is_visible_at(&self, t: f64) -> bool {
        t >= self.visible_from && t < self.visible_until
    }

    pub fn animations(&self) -> [AnimationKind; 2] {
        self.content.animations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(from: f64, until: f64) -> Overlay {
        Overlay {
            id: OverlayId(1),
            content: OverlayContent::text("Hello"),
            visible_from: from,
            visible_until: until,
            position: Position::new(100.0, 100.0),
            size: 18.0,
        }
    }

    #[test]
    fn test_visibility_window_bounds() {
        let o = overlay(3.0, 8.0);
        assert!(!o.is_visible_at(2.0));
        assert!(o.is_visible_at(3.0));
        assert!(o.is_visible_at(7.999));
        assert!(!o.is_visible_at(8.0));
    }

    #[test]
    fn test_animations_fixed_per_content_type() {
        assert_eq!(
            OverlayContent::text("x").animations(),
            [AnimationKind::FadeIn, AnimationKind::BounceColor]
        );
        assert_eq!(
            OverlayContent::image("logo.png").animations(),
            [AnimationKind::FadeIn, AnimationKind::RotateLoop]
        );
    }

    #[test]
    fn test_spec_deserializes_with_defaults() {
        let json = r#"{
            "content": { "type": "image", "source": "sticker.png" },
            "visible_from": 1,
            "visible_until": 4
        }"#;
        let spec: OverlaySpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.content, OverlayContent::image("sticker.png"));
        assert!(spec.size.is_none());
        assert!(spec.position.is_none());
    }

    #[test]
    fn test_position_translation() {
        let p = Position::new(100.0, 100.0).translated(-20.0, 35.5);
        assert_eq!(p, Position::new(80.0, 135.5));
    }

    proptest::proptest! {
        #[test]
        fn prop_visibility_matches_half_open_window(
            from in 0.0f64..100.0,
            len in 0.001f64..50.0,
            t in 0.0f64..200.0,
        ) {
            let o = overlay(from, from + len);
            proptest::prop_assert_eq!(o.is_visible_at(t), from <= t && t < from + len);
        }
    }
}
