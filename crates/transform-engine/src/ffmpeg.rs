//! ffmpeg-backed transform executor.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::process::Command;

use reelsync_common::config::TransformConfig;
use reelsync_common::error::JobFailure;
use reelsync_media_model::{MediaRef, TransformDescription};
use reelsync_sync_engine::TransformExecutor;

use crate::filtergraph::render_filter_graph;

/// stderr lines kept in a failure reason.
const STDERR_TAIL_LINES: usize = 6;

/// Renders filtered copies with an external ffmpeg binary.
///
/// Each job writes a new file under `output_dir`; nothing is overwritten in
/// place, so a result reference stays valid for the whole session.
#[derive(Debug)]
pub struct FfmpegExecutor {
    ffmpeg_path: String,
    output_dir: PathBuf,
    counter: AtomicU64,
}

impl FfmpegExecutor {
    pub fn new(ffmpeg_path: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            output_dir: output_dir.into(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &TransformConfig) -> Self {
        Self::new(config.ffmpeg_path.clone(), config.output_dir.clone())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Whether the configured ffmpeg binary runs.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Next unused output path for a rendition of `source`.
    pub fn next_output_path(&self, source: &MediaRef) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let stem = source.stem().unwrap_or("media");
        let ext = source
            .local_path()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        self.output_dir
            .join(format!("{stem}-{}-{n}.{ext}", std::process::id()))
    }

    /// Full ffmpeg argument list for one render.
    pub fn command_args(
        &self,
        source: &Path,
        description: &TransformDescription,
        output: &Path,
    ) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            source.to_string_lossy().into_owned(),
            "-vf".to_string(),
            render_filter_graph(description),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-c:a".to_string(),
            "copy".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl TransformExecutor for FfmpegExecutor {
    async fn execute(
        &self,
        source: &MediaRef,
        description: &TransformDescription,
    ) -> Result<MediaRef, JobFailure> {
        let input = source.local_path();
        if !input.exists() {
            return Err(JobFailure::ExecutionFailed(format!(
                "source not found: {}",
                input.display()
            )));
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                JobFailure::ExecutionFailed(format!(
                    "cannot create {}: {e}",
                    self.output_dir.display()
                ))
            })?;

        let output = self.next_output_path(source);
        let args = self.command_args(input, description, &output);
        tracing::debug!(args = ?args, "Running ffmpeg");

        let start = std::time::Instant::now();
        let result = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| JobFailure::ExecutionFailed(format!("failed to start ffmpeg: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail = stderr_tail(&stderr, STDERR_TAIL_LINES);
            tracing::warn!(status = %result.status, "ffmpeg render failed");
            return Err(JobFailure::ExecutionFailed(format!(
                "ffmpeg exited with {}: {tail}",
                result.status
            )));
        }

        tracing::info!(
            output = %output.display(),
            ops = ?description.op_names(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ffmpeg render complete"
        );
        Ok(MediaRef::from_path(output))
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

fn stderr_tail(stderr: &str, lines: usize) -> String {
    let kept: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let from = kept.len().saturating_sub(lines);
    kept[from..].join(" | ")
}
