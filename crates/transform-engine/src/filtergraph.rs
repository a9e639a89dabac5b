//! ffmpeg `-vf` rendering of transform descriptions.

use reelsync_media_model::{CurvePoint, TransformDescription, TransformOp};

/// Channel order of `colorchannelmixer` options, matching the row-major
/// coefficient layout of [`TransformOp::ColorMatrix`].
const MIXER_KEYS: [&str; 12] = [
    "rr", "rg", "rb", "ra", "gr", "gg", "gb", "ga", "br", "bg", "bb", "ba",
];

/// Render a description as a comma-separated ffmpeg filter chain.
///
/// The identity description renders as `null`.
pub fn render_filter_graph(description: &TransformDescription) -> String {
    if description.is_identity() {
        return "null".to_string();
    }
    description
        .operations
        .iter()
        .map(render_op)
        .collect::<Vec<_>>()
        .join(",")
}

fn render_op(op: &TransformOp) -> String {
    match op {
        TransformOp::ColorMatrix { coefficients } => {
            let options = MIXER_KEYS
                .iter()
                .zip(coefficients)
                .map(|(key, value)| format!("{key}={}", num(*value)))
                .collect::<Vec<_>>()
                .join(":");
            format!("colorchannelmixer={options}")
        }
        TransformOp::CurveAdjust { red, green, blue } => format!(
            "curves=r='{}':g='{}':b='{}'",
            curve(red),
            curve(green),
            curve(blue)
        ),
        TransformOp::HueSaturationShift {
            hue_degrees,
            saturation,
        } => format!("hue=h={}:s={}", num(*hue_degrees), num(*saturation)),
        TransformOp::Grayscale => "format=gray".to_string(),
        TransformOp::Invert => "negate".to_string(),
    }
}

fn curve(points: &[CurvePoint]) -> String {
    points
        .iter()
        .map(|p| format!("{}/{}", num(p.x), num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shortest decimal form with at most four fractional digits.
fn num(value: f64) -> String {
    let s = format!("{value:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
