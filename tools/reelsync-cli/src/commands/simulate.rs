//! Replay an editing session script.
//!
//! A script is a JSON object with optional `features` and a list of session
//! events. Events are applied in order; transform jobs run on the selected
//! executor and their results are delivered `job_latency` events after
//! submission, which makes late and superseded results easy to reproduce.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use reelsync_common::config::AppConfig;
use reelsync_common::error::ReelsyncResult;
use reelsync_common::time::format_position;
use reelsync_media_model::MediaRef;
use reelsync_sync_engine::{
    EditorSession, JobTicket, SessionEvent, SessionFeatures, SessionNotice, SurfaceCommand,
    TransformExecutor,
};
use reelsync_transform_engine::{FailingExecutor, FfmpegExecutor, InstantExecutor};

/// Transform executor used during replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExecutorKind {
    /// Succeed immediately with a synthetic media reference
    Instant,
    /// Fail every job
    Failing,
    /// Render with the configured ffmpeg
    Ffmpeg,
}

#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub source: Option<MediaRef>,
    #[serde(default)]
    pub features: SessionFeatures,
    pub events: Vec<SessionEvent>,
}

impl Script {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read script {}: {e}", path.display()))?;
        serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse script {}: {e}", path.display()))
    }
}

/// What one replayed event (or job delivery) produced.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub label: String,
    pub position: f64,
    pub commands: Vec<String>,
    pub notices: Vec<SessionNotice>,
    pub error: Option<String>,
    pub visible_overlays: Vec<String>,
}

pub struct Replay {
    pub steps: Vec<StepReport>,
    pub session: EditorSession,
}

pub async fn run(
    config: AppConfig,
    script_path: PathBuf,
    executor: ExecutorKind,
    job_latency: usize,
    json: bool,
) -> anyhow::Result<()> {
    let script = Script::load(&script_path)?;
    let executor: Box<dyn TransformExecutor> = match executor {
        ExecutorKind::Instant => Box::new(InstantExecutor::new()),
        ExecutorKind::Failing => Box::new(FailingExecutor::new("simulated failure")),
        ExecutorKind::Ffmpeg => Box::new(FfmpegExecutor::from_config(&config.transform)),
    };

    println!("Replaying {}", script_path.display());
    if let Some(source) = &script.source {
        println!("  Source: {source}");
    }
    println!(
        "  Features: audio={} overlays={} filters={:?}",
        script.features.secondary_audio, script.features.overlays, script.features.filter_mode
    );
    println!("  Executor: {}, job latency: {job_latency} events", executor.name());
    println!();

    let replay = replay(config, script, executor.as_ref(), job_latency).await;

    for (index, step) in replay.steps.iter().enumerate() {
        println!("[{index:>3}] {} {}", format_position(step.position), step.label);
        for command in &step.commands {
            println!("      -> {command}");
        }
        for notice in &step.notices {
            println!("      !  {}", serde_json::to_string(notice)?);
        }
        if let Some(error) = &step.error {
            println!("      x  {error}");
        }
        for overlay in &step.visible_overlays {
            println!("      *  {overlay}");
        }
    }

    let snapshot = replay.session.snapshot();
    println!();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!(
            "Final: {} in [{}, {}), {} sync, effect {}, job {}",
            format_position(snapshot.position),
            format_position(snapshot.trim_start),
            format_position(snapshot.trim_end),
            serde_json::to_string(&snapshot.sync_phase)?.trim_matches('"'),
            snapshot.selected_effect,
            snapshot.job_state,
        );
        if let Some(media) = &snapshot.active_media {
            println!("Active media: {media}");
        }
    }

    Ok(())
}

/// Apply every script event to a fresh session.
pub async fn replay(
    config: AppConfig,
    script: Script,
    executor: &dyn TransformExecutor,
    job_latency: usize,
) -> Replay {
    let mut session = EditorSession::new(config, script.features);
    let mut pending: VecDeque<(usize, JobTicket)> = VecDeque::new();
    let mut steps = Vec::new();

    for (index, event) in script.events.into_iter().enumerate() {
        let label = format!("{event:?}");
        let result = session.handle(event);
        steps.push(record(&mut session, label, result, &mut pending, index + job_latency));

        while pending.front().is_some_and(|(due, _)| *due <= index) {
            if let Some((_, ticket)) = pending.pop_front() {
                steps.push(deliver(&mut session, executor, ticket, &mut pending, index).await);
            }
        }
    }

    while let Some((due, ticket)) = pending.pop_front() {
        steps.push(deliver(&mut session, executor, ticket, &mut pending, due).await);
    }

    Replay { steps, session }
}

async fn deliver(
    session: &mut EditorSession,
    executor: &dyn TransformExecutor,
    ticket: JobTicket,
    pending: &mut VecDeque<(usize, JobTicket)>,
    now: usize,
) -> StepReport {
    let seq = ticket.seq;
    let result = executor
        .execute(&ticket.request.source, &ticket.description)
        .await;
    let label = match &result {
        Ok(media) => format!("job {seq} ({}) finished: {media}", ticket.request.effect),
        Err(reason) => format!("job {seq} ({}) failed: {reason}", ticket.request.effect),
    };
    let outcome = session.handle(SessionEvent::JobCompleted { seq, result });
    record(session, label, outcome, pending, now)
}

fn record(
    session: &mut EditorSession,
    label: String,
    result: ReelsyncResult<Vec<SurfaceCommand>>,
    pending: &mut VecDeque<(usize, JobTicket)>,
    due: usize,
) -> StepReport {
    let (commands, error) = match result {
        Ok(commands) => (commands, None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };

    let described = commands.iter().map(SurfaceCommand::describe).collect();
    for command in commands {
        if let SurfaceCommand::Transform(ticket) = command {
            pending.push_back((due, ticket));
        }
    }

    let visible_overlays = session
        .visible_overlays()
        .map(|v| {
            format!(
                "{} {} at ({:.0}, {:.0}) size {:.0} opacity {:.2} scale {:.2} rotation {:.0}",
                v.overlay.id,
                v.overlay.content.kind_label(),
                v.overlay.position.x,
                v.overlay.position.y,
                v.overlay.size,
                v.phase.opacity,
                v.phase.scale,
                v.phase.rotation_degrees,
            )
        })
        .collect();

    StepReport {
        label,
        position: session.primary().position(),
        commands: described,
        notices: session.drain_notices(),
        error,
        visible_overlays,
    }
}
