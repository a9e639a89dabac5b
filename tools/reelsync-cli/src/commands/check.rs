//! Check external tools and configuration.

use std::process::Stdio;

use reelsync_common::config::AppConfig;
use reelsync_transform_engine::FfmpegExecutor;

pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Reelsync System Check");
    println!("{}", "=".repeat(50));

    let mut ok = true;

    match config.validate() {
        Ok(()) => println!("[OK] Configuration valid"),
        Err(e) => {
            ok = false;
            println!("[FAIL] Configuration: {e}");
        }
    }

    let executor = FfmpegExecutor::from_config(&config.transform);
    if executor.is_available().await {
        println!("[OK] ffmpeg: {}", config.transform.ffmpeg_path);
    } else {
        ok = false;
        println!(
            "[FAIL] ffmpeg not runnable at '{}' (needed for baked filters)",
            config.transform.ffmpeg_path
        );
    }

    if tool_runs(&config.transform.ffprobe_path).await {
        println!("[OK] ffprobe: {}", config.transform.ffprobe_path);
    } else {
        println!(
            "[WARN] ffprobe not runnable at '{}' (durations will not be probed)",
            config.transform.ffprobe_path
        );
    }

    let out = executor.output_dir();
    match tokio::fs::create_dir_all(out).await {
        Ok(()) => println!("[OK] Render directory: {}", out.display()),
        Err(e) => {
            ok = false;
            println!("[FAIL] Render directory {}: {e}", out.display());
        }
    }

    println!();
    println!(
        "Drift tolerance: {:.0}ms, default trim: {:.1}s",
        config.sync.drift_tolerance_secs * 1000.0,
        config.playback.default_trim_secs
    );

    println!();
    if ok {
        println!("All required tools are available. Reelsync is ready.");
    } else {
        println!("Some required tools are missing. See above for fixes.");
    }

    Ok(())
}

async fn tool_runs(binary: &str) -> bool {
    tokio::process::Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}
