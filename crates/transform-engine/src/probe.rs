//! Media duration probing via ffprobe.

use std::path::Path;

use tokio::process::Command;

use reelsync_common::error::{ReelsyncError, ReelsyncResult};

/// Query the container duration of `path` in seconds.
pub async fn probe_duration(ffprobe_path: &str, path: &Path) -> ReelsyncResult<f64> {
    if !path.exists() {
        return Err(ReelsyncError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let output = Command::new(ffprobe_path)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| {
            ReelsyncError::load(path.display().to_string(), format!("failed to run ffprobe: {e}"))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReelsyncError::load(
            path.display().to_string(),
            format!("ffprobe exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let duration = parse_duration(&stdout).ok_or_else(|| {
        ReelsyncError::load(
            path.display().to_string(),
            format!("unreadable duration {:?}", stdout.trim()),
        )
    })?;
    tracing::debug!(path = %path.display(), duration, "Probed media duration");
    Ok(duration)
}

/// Parse ffprobe's bare duration output. Rejects `N/A` and non-positive values.
pub fn parse_duration(stdout: &str) -> Option<f64> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    let secs = line.parse::<f64>().ok()?;
    (secs.is_finite() && secs > 0.0).then_some(secs)
}
