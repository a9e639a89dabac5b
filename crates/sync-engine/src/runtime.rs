//! Async control loop.
//!
//! All session mutation happens on one task. User events, surface
//! notifications and job completions arrive on channels and are processed one
//! at a time; surface commands are applied in order before the next event is
//! taken. Transform jobs run on spawned tasks and report back through the
//! completion channel, so a slow executor never blocks the loop.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use reelsync_common::error::{JobFailure, ReelsyncError, ReelsyncResult};
use reelsync_media_model::MediaRef;

use crate::command::{SurfaceCommand, VideoCommand};
use crate::jobs::{JobSeq, JobTicket};
use crate::session::{EditorSession, SessionEvent, SessionNotice};
use crate::surface::{apply_audio, apply_video, AudioSurface, MediaSurface, TransformExecutor};

/// Inbox capacity for [`SessionHandle`].
const INBOX_CAPACITY: usize = 256;

enum RuntimeInput {
    Event(SessionEvent),
    AttachAudio(MediaRef),
    Shutdown,
}

type JobResult = (JobSeq, Result<MediaRef, JobFailure>);

/// Cloneable sender side of a running session.
#[derive(Clone)]
pub struct SessionHandle {
    inbox: mpsc::Sender<RuntimeInput>,
    active_media: watch::Receiver<Option<MediaRef>>,
}

impl SessionHandle {
    /// Queue an event for the control loop.
    pub async fn send(&self, event: SessionEvent) -> ReelsyncResult<()> {
        self.push(RuntimeInput::Event(event)).await
    }

    /// Load `media` on the audio surface, then attach it as the secondary track.
    pub async fn attach_audio(&self, media: MediaRef) -> ReelsyncResult<()> {
        self.push(RuntimeInput::AttachAudio(media)).await
    }

    /// Stop the loop after the events already queued.
    pub async fn shutdown(&self) -> ReelsyncResult<()> {
        self.push(RuntimeInput::Shutdown).await
    }

    /// Active media reference; replaced whole on every change.
    pub fn active_media(&self) -> watch::Receiver<Option<MediaRef>> {
        self.active_media.clone()
    }

    async fn push(&self, input: RuntimeInput) -> ReelsyncResult<()> {
        self.inbox
            .send(input)
            .await
            .map_err(|_| ReelsyncError::Other(anyhow::anyhow!("session runtime has stopped")))
    }
}

/// Owns the session and its collaborators for the lifetime of the loop.
pub struct SessionRuntime {
    session: EditorSession,
    video: Box<dyn MediaSurface>,
    audio: Option<Box<dyn AudioSurface>>,
    executor: Arc<dyn TransformExecutor>,
    inbox: mpsc::Receiver<RuntimeInput>,
    completions_tx: mpsc::UnboundedSender<JobResult>,
    completions_rx: mpsc::UnboundedReceiver<JobResult>,
    active_tx: watch::Sender<Option<MediaRef>>,
    notices_tx: mpsc::UnboundedSender<SessionNotice>,
}

impl SessionRuntime {
    /// Build a runtime. Returns it with its handle and the notice stream.
    pub fn new(
        session: EditorSession,
        video: Box<dyn MediaSurface>,
        audio: Option<Box<dyn AudioSurface>>,
        executor: Arc<dyn TransformExecutor>,
    ) -> (Self, SessionHandle, mpsc::UnboundedReceiver<SessionNotice>) {
        let (inbox_tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (active_tx, active_rx) = watch::channel(session.active_media().cloned());
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();

        let runtime = Self {
            session,
            video,
            audio,
            executor,
            inbox,
            completions_tx,
            completions_rx,
            active_tx,
            notices_tx,
        };
        let handle = SessionHandle {
            inbox: inbox_tx,
            active_media: active_rx,
        };
        (runtime, handle, notices_rx)
    }

    /// Process events until shutdown or until every handle is dropped.
    ///
    /// Returns the session so callers can inspect its final state.
    pub async fn run(mut self) -> EditorSession {
        tracing::info!(executor = self.executor.name(), "Session runtime started");

        loop {
            tokio::select! {
                input = self.inbox.recv() => match input {
                    Some(RuntimeInput::Event(event)) => self.process(event).await,
                    Some(RuntimeInput::AttachAudio(media)) => self.attach_audio(media).await,
                    Some(RuntimeInput::Shutdown) | None => break,
                },
                Some((seq, result)) = self.completions_rx.recv() => {
                    self.process(SessionEvent::JobCompleted { seq, result }).await;
                }
            }
        }

        tracing::info!("Session runtime stopped");
        self.session
    }

    async fn process(&mut self, event: SessionEvent) {
        match self.session.handle(event) {
            Ok(commands) => self.dispatch(commands).await,
            Err(e) => self.report(e),
        }
        self.publish();
    }

    async fn attach_audio(&mut self, media: MediaRef) {
        let Some(surface) = self.audio.as_mut() else {
            self.report(ReelsyncError::unsupported("no audio surface available"));
            self.publish();
            return;
        };

        let loaded = surface.load(&media).await;
        match loaded.and_then(|duration| self.session.attach_audio(media, duration)) {
            Ok(commands) => self.dispatch(commands).await,
            Err(e) => self.report(e),
        }
        self.publish();
    }

    async fn dispatch(&mut self, commands: Vec<SurfaceCommand>) {
        let mut queue: VecDeque<SurfaceCommand> = commands.into();

        while let Some(command) = queue.pop_front() {
            tracing::debug!(command = %command.describe(), "Applying surface command");
            match command {
                SurfaceCommand::Video(VideoCommand::Load { media }) => {
                    match self.video.load(&media).await {
                        Ok(duration) => match self.session.on_media_loaded(&media, duration) {
                            Ok(follow_up) => queue.extend(follow_up),
                            Err(e) => self.report(e),
                        },
                        Err(e) => {
                            self.session.on_media_load_failed(&media, &e);
                            self.report(e);
                        }
                    }
                }
                SurfaceCommand::Video(video) => apply_video(self.video.as_mut(), &video),
                SurfaceCommand::Audio(audio) => match self.audio.as_mut() {
                    Some(surface) => apply_audio(surface.as_mut(), audio),
                    None => tracing::warn!(?audio, "No audio surface, dropping command"),
                },
                SurfaceCommand::Shader { amount } => self.video.set_shader_amount(amount),
                SurfaceCommand::Transform(ticket) => self.spawn_job(ticket),
            }
        }
    }

    fn spawn_job(&self, ticket: JobTicket) {
        let executor = Arc::clone(&self.executor);
        let completions = self.completions_tx.clone();

        tokio::spawn(async move {
            let JobTicket {
                seq,
                request,
                description,
            } = ticket;
            let result = executor.execute(&request.source, &description).await;
            if completions.send((seq, result)).is_err() {
                tracing::debug!(seq, "Runtime gone before job completed");
            }
        });
    }

    fn report(&mut self, error: ReelsyncError) {
        tracing::warn!(error = %error, "Session event rejected");
        let notice = SessionNotice::Error {
            message: error.to_string(),
        };
        if self.notices_tx.send(notice).is_err() {
            tracing::debug!("Notice receiver dropped");
        }
    }

    fn publish(&mut self) {
        for notice in self.session.drain_notices() {
            if self.notices_tx.send(notice).is_err() {
                tracing::debug!("Notice receiver dropped");
            }
        }

        let active = self.session.active_media().cloned();
        self.active_tx.send_if_modified(|current| {
            if *current != active {
                *current = active;
                true
            } else {
                false
            }
        });
    }
}
