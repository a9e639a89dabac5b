//! Render a filtered copy of a video.

use std::path::PathBuf;

use reelsync_common::config::AppConfig;
use reelsync_media_model::MediaRef;
use reelsync_sync_engine::{EffectCatalog, TransformExecutor};
use reelsync_transform_engine::{probe_duration, render_filter_graph, FfmpegExecutor};

pub async fn run(
    config: &AppConfig,
    input: PathBuf,
    effect: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let catalog = EffectCatalog::builtin();
    let entry = catalog.lookup(effect)?;

    println!("Applying {} to: {}", entry.name, input.display());

    if entry.is_identity() {
        println!("  {} is the identity effect; nothing to render.", entry.name);
        return Ok(());
    }

    let executor = FfmpegExecutor::from_config(&config.transform);
    if !executor.is_available().await {
        anyhow::bail!(
            "ffmpeg not found at '{}'; run `reelsync check`",
            config.transform.ffmpeg_path
        );
    }

    match probe_duration(&config.transform.ffprobe_path, &input).await {
        Ok(duration) => println!("  Duration: {duration:.2}s"),
        Err(e) => tracing::warn!(error = %e, "Could not probe input duration"),
    }
    println!("  Filter: {}", render_filter_graph(&entry.description));

    let started = std::time::Instant::now();
    let rendered = executor
        .execute(&MediaRef::from_path(&input), &entry.description)
        .await
        .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;

    let final_path = match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::copy(rendered.local_path(), &path).await?;
            tokio::fs::remove_file(rendered.local_path()).await?;
            path
        }
        None => rendered.local_path().to_path_buf(),
    };

    println!(
        "Render complete in {:.1}s: {}",
        started.elapsed().as_secs_f64(),
        final_path.display()
    );
    Ok(())
}
