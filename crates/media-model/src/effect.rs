//! Declarative transform descriptions.
//!
//! A transform is an ordered list of parameterized operations. The engine
//! never interprets the pixels itself; executors translate the description
//! into whatever their backend understands.

use serde::{Deserialize, Serialize};

/// One control point on a tone curve, both axes normalized to `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f64,
    pub y: f64,
}

impl CurvePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Build a curve from output levels at evenly spaced input levels.
pub fn evenly_spaced_curve(levels: &[f64]) -> Vec<CurvePoint> {
    match levels.len() {
        0 => vec![],
        1 => vec![CurvePoint::new(0.0, levels[0])],
        n => {
            let step = 1.0 / (n - 1) as f64;
            levels
                .iter()
                .enumerate()
                .map(|(i, y)| CurvePoint::new(i as f64 * step, *y))
                .collect()
        }
    }
}

/// A single named, parameterized transform operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformOp {
    /// 3x4 channel mixing matrix, row-major: `[rr, rg, rb, ra, gr, gg, gb, ga, br, bg, bb, ba]`.
    ColorMatrix { coefficients: [f64; 12] },

    /// Per-channel tone curves.
    CurveAdjust {
        red: Vec<CurvePoint>,
        green: Vec<CurvePoint>,
        blue: Vec<CurvePoint>,
    },

    /// Hue rotation in degrees and saturation multiplier.
    HueSaturationShift { hue_degrees: f64, saturation: f64 },

    /// Drop chroma.
    Grayscale,

    /// Invert every channel.
    Invert,
}

impl TransformOp {
    /// Stable operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ColorMatrix { .. } => "color_matrix",
            Self::CurveAdjust { .. } => "curve_adjust",
            Self::HueSaturationShift { .. } => "hue_saturation_shift",
            Self::Grayscale => "grayscale",
            Self::Invert => "invert",
        }
    }
}

/// Ordered transform pipeline. Empty means identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformDescription {
    pub operations: Vec<TransformOp>,
}

impl TransformDescription {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn single(op: TransformOp) -> Self {
        Self {
            operations: vec![op],
        }
    }

    /// Append an operation (builder style).
    pub fn then(mut self, op: TransformOp) -> Self {
        self.operations.push(op);
        self
    }

    pub fn is_identity(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operation names in application order.
    pub fn op_names(&self) -> Vec<&'static str> {
        self.operations.iter().map(TransformOp::name).collect()
    }
}

/// How the selected effect reaches the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Pre-render a filtered copy through the transform executor.
    #[default]
    Baked,
    /// Drive a live shader parameter; no transform job.
    Live,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evenly_spaced_curve() {
        let curve = evenly_spaced_curve(&[0.0, 0.1, 0.5, 0.9, 1.0]);
        assert_eq!(curve.len(), 5);
        assert_eq!(curve[1], CurvePoint::new(0.25, 0.1));
        assert_eq!(curve[4], CurvePoint::new(1.0, 1.0));
        assert!(evenly_spaced_curve(&[]).is_empty());
    }

    #[test]
    fn test_description_builder_and_names() {
        let desc = TransformDescription::single(TransformOp::Grayscale).then(TransformOp::Invert);
        assert!(!desc.is_identity());
        assert_eq!(desc.op_names(), vec!["grayscale", "invert"]);
        assert!(TransformDescription::identity().is_identity());
    }

    #[test]
    fn test_op_tagged_serialization() {
        let op = TransformOp::HueSaturationShift {
            hue_degrees: 0.0,
            saturation: 2.0,
        };
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["op"], "hue_saturation_shift");
        assert_eq!(value["saturation"], 2.0);
    }
}
