//! Built-in effect catalog.
//!
//! Maps effect names to transform descriptions and, for effects that can be
//! previewed without rendering, a live shader amount.

use reelsync_common::error::{ReelsyncError, ReelsyncResult};
use reelsync_media_model::{evenly_spaced_curve, FilterMode, TransformDescription, TransformOp};

/// Name of the identity entry.
pub const NORMAL: &str = "Normal";

const SEPIA_MATRIX: [f64; 12] = [
    0.393, 0.769, 0.189, 0.0, //
    0.349, 0.686, 0.168, 0.0, //
    0.272, 0.534, 0.131, 0.0,
];

/// One named effect.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectEntry {
    pub name: &'static str,
    pub description: TransformDescription,
    /// Saturation-style parameter for the live shader, if the effect has one.
    pub shader_amount: Option<f64>,
}

impl EffectEntry {
    /// Whether the entry can be shown in the given filter mode.
    pub fn supports(&self, mode: FilterMode) -> bool {
        match mode {
            FilterMode::Baked => true,
            FilterMode::Live => self.shader_amount.is_some(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.description.is_identity()
    }
}

/// Ordered, immutable effect table.
#[derive(Debug, Clone)]
pub struct EffectCatalog {
    entries: Vec<EffectEntry>,
}

impl Default for EffectCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EffectCatalog {
    /// The stock effects, in menu order.
    pub fn builtin() -> Self {
        let saturate = |saturation: f64| TransformOp::HueSaturationShift {
            hue_degrees: 0.0,
            saturation,
        };

        let entries = vec![
            entry(NORMAL, TransformDescription::identity(), Some(1.0)),
            entry("Grayscale", TransformDescription::single(TransformOp::Grayscale), None),
            entry(
                "Sepia",
                TransformDescription::single(TransformOp::ColorMatrix {
                    coefficients: SEPIA_MATRIX,
                }),
                None,
            ),
            entry("Invert", TransformDescription::single(TransformOp::Invert), None),
            entry("Vivid", TransformDescription::single(saturate(2.0)), Some(2.0)),
            entry(
                "Vivid Warm",
                TransformDescription::single(saturate(2.0)).then(warm_curves()),
                Some(2.0),
            ),
            entry(
                "Vivid Cool",
                TransformDescription::single(saturate(2.0)).then(cool_curves()),
                Some(2.0),
            ),
            entry("Mono", TransformDescription::single(saturate(0.0)), Some(0.0)),
            entry(
                "Dramatic",
                TransformDescription::single(dramatic_curves()),
                Some(1.8),
            ),
            entry("Cool", TransformDescription::single(cool_curves()), None),
            entry("Warm", TransformDescription::single(warm_curves()), None),
        ];

        Self { entries }
    }

    pub fn entries(&self) -> &[EffectEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, name: &str) -> ReelsyncResult<&EffectEntry> {
        self.position(name).map(|i| &self.entries[i])
    }

    /// Shorthand for the transform description of `name`.
    pub fn description(&self, name: &str) -> ReelsyncResult<&TransformDescription> {
        self.lookup(name).map(|e| &e.description)
    }

    /// Next entry after `name` usable in `mode`, wrapping at the end.
    pub fn next_after(&self, name: &str, mode: FilterMode) -> ReelsyncResult<&EffectEntry> {
        let start = self.position(name)?;
        let n = self.entries.len();
        (1..=n)
            .map(|step| &self.entries[(start + step) % n])
            .find(|e| e.supports(mode))
            .ok_or_else(|| ReelsyncError::unsupported(format!("no {mode:?} effects available")))
    }

    /// Previous entry before `name` usable in `mode`, wrapping at the start.
    pub fn previous_before(&self, name: &str, mode: FilterMode) -> ReelsyncResult<&EffectEntry> {
        let start = self.position(name)?;
        let n = self.entries.len();
        (1..=n)
            .map(|step| &self.entries[(start + n - step) % n])
            .find(|e| e.supports(mode))
            .ok_or_else(|| ReelsyncError::unsupported(format!("no {mode:?} effects available")))
    }

    fn position(&self, name: &str) -> ReelsyncResult<usize> {
        let wanted = name.trim();
        self.entries
            .iter()
            .position(|e| e.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ReelsyncError::unknown_effect(name))
    }
}

fn entry(
    name: &'static str,
    description: TransformDescription,
    shader_amount: Option<f64>,
) -> EffectEntry {
    EffectEntry {
        name,
        description,
        shader_amount,
    }
}

fn curves(red: &[f64], green: &[f64], blue: &[f64]) -> TransformOp {
    TransformOp::CurveAdjust {
        red: evenly_spaced_curve(red),
        green: evenly_spaced_curve(green),
        blue: evenly_spaced_curve(blue),
    }
}

fn dramatic_curves() -> TransformOp {
    let s = [0.0, 0.1, 0.5, 0.9, 1.0];
    curves(&s, &s, &s)
}

fn cool_curves() -> TransformOp {
    curves(
        &[0.0, 0.1, 0.5, 0.9, 1.0],
        &[0.0, 0.2, 0.6, 0.8, 1.0],
        &[0.0, 0.3, 0.7, 1.0, 1.0],
    )
}

fn warm_curves() -> TransformOp {
    curves(
        &[0.0, 0.1, 0.5, 0.8, 1.0],
        &[0.0, 0.3, 0.7, 1.0, 1.0],
        &[0.0, 0.2, 0.6, 1.0, 1.0],
    )
}
