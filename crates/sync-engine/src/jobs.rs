//! Transform job management.
//!
//! At most one job is running per timeline. Submitting while a job is running
//! supersedes it: the newest request is always the source of truth. The
//! executor is never told about supersession; its late result is dropped
//! when it arrives.
//!
//! Every submission, including identity selections that start no job, takes
//! the next sequence number. A completion is applied only if its sequence
//! number is still the latest one.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use reelsync_common::error::JobFailure;
use reelsync_media_model::{MediaRef, TransformDescription};

/// Monotonic job sequence number.
pub type JobSeq = u64;

/// Finished jobs retained for display.
pub const HISTORY_CAPACITY: usize = 16;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformRequest {
    pub effect: String,
    pub source: MediaRef,
    /// Primary position to restore once the result is swapped in.
    pub resume_position: f64,
}

/// Work order handed to a transform executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobTicket {
    pub seq: JobSeq,
    pub request: TransformRequest,
    pub description: TransformDescription,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Idle,
    Running,
    Succeeded(MediaRef),
    Failed(JobFailure),
    Cancelled,
}

impl JobState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// One submitted job.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformJob {
    pub seq: JobSeq,
    pub request: TransformRequest,
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TransformJob {
    fn finish(&mut self, state: JobState) {
        self.state = state;
        self.finished_at = Some(Utc::now());
    }
}

/// Result of [`TransformJobManager::submit`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    /// Ticket for the executor; `None` for identity transforms.
    pub ticket: Option<JobTicket>,
    /// Running job that this submission cancelled.
    pub superseded: Option<JobSeq>,
}

/// What a completion did.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Result swapped in as the active media.
    Applied {
        seq: JobSeq,
        media: MediaRef,
        resume_position: f64,
    },
    /// The latest job failed; active media unchanged.
    Failed { seq: JobSeq, reason: JobFailure },
    /// Completion for a superseded job, dropped.
    Discarded { seq: JobSeq },
}

/// Tracks the running job, the active media reference and recent history.
#[derive(Debug, Clone, Default)]
pub struct TransformJobManager {
    latest_seq: JobSeq,
    current: Option<TransformJob>,
    active_media: Option<MediaRef>,
    /// Media shown before the last applied result, until that result loads.
    replaced: Option<(JobSeq, Option<MediaRef>)>,
    history: VecDeque<TransformJob>,
}

impl TransformJobManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active media with a new source, superseding any running job.
    pub fn set_source(&mut self, media: MediaRef) -> Option<JobSeq> {
        self.latest_seq += 1;
        let superseded = self.cancel_running();
        self.current = None;
        self.replaced = None;
        tracing::info!(media = %media, "Active media replaced by new source");
        self.active_media = Some(media);
        superseded
    }

    /// Submit a request. The latest submission always wins.
    pub fn submit(
        &mut self,
        request: TransformRequest,
        description: TransformDescription,
    ) -> SubmitOutcome {
        self.latest_seq += 1;
        let seq = self.latest_seq;
        let superseded = self.cancel_running();

        if description.is_identity() {
            tracing::info!(seq, effect = %request.effect, "Identity effect, keeping active media");
            self.current = None;
            return SubmitOutcome {
                ticket: None,
                superseded,
            };
        }

        tracing::info!(
            seq,
            effect = %request.effect,
            source = %request.source,
            resume_position = request.resume_position,
            ops = ?description.op_names(),
            "Transform job submitted"
        );

        self.current = Some(TransformJob {
            seq,
            request: request.clone(),
            state: JobState::Running,
            submitted_at: Utc::now(),
            finished_at: None,
        });

        SubmitOutcome {
            ticket: Some(JobTicket {
                seq,
                request,
                description,
            }),
            superseded,
        }
    }

    /// Apply an executor result for job `seq`.
    pub fn complete(&mut self, seq: JobSeq, result: Result<MediaRef, JobFailure>) -> Completion {
        let is_current = seq == self.latest_seq
            && self
                .current
                .as_ref()
                .is_some_and(|job| job.seq == seq && job.state == JobState::Running);
        if !is_current {
            tracing::debug!(seq, latest = self.latest_seq, "Discarding stale job result");
            return Completion::Discarded { seq };
        }
        let Some(job) = self.current.as_mut() else {
            return Completion::Discarded { seq };
        };

        let completion = match result {
            Ok(media) => {
                tracing::info!(seq, media = %media, "Transform job succeeded");
                job.finish(JobState::Succeeded(media.clone()));
                let previous = self.active_media.replace(media.clone());
                self.replaced = Some((seq, previous));
                Completion::Applied {
                    seq,
                    media,
                    resume_position: job.request.resume_position,
                }
            }
            Err(JobFailure::Cancelled) => {
                tracing::info!(seq, "Transform job cancelled by executor");
                job.finish(JobState::Cancelled);
                Completion::Failed {
                    seq,
                    reason: JobFailure::Cancelled,
                }
            }
            Err(reason) => {
                tracing::warn!(seq, %reason, "Transform job failed");
                job.finish(JobState::Failed(reason.clone()));
                Completion::Failed { seq, reason }
            }
        };

        let finished = job.clone();
        self.record(finished);
        completion
    }

    /// The surface finished loading `media`; an applied result can no longer
    /// be reverted.
    pub fn result_loaded(&mut self, media: &MediaRef) {
        if self.active_media.as_ref() == Some(media) {
            self.replaced = None;
        }
    }

    /// The surface could not load the applied result `media`.
    ///
    /// Restores the media that was active before the result was applied and
    /// marks the job failed. Returns the job's sequence number if `media` was
    /// the applied result.
    pub fn revert_result(&mut self, media: &MediaRef, reason: JobFailure) -> Option<JobSeq> {
        if self.active_media.as_ref() != Some(media) {
            return None;
        }
        let (seq, previous) = self.replaced.take()?;
        tracing::warn!(seq, media = %media, %reason, "Transform result failed to load, reverting");
        self.active_media = previous;

        let failed = JobState::Failed(reason);
        if let Some(job) = self.current.as_mut().filter(|job| job.seq == seq) {
            job.state = failed.clone();
        }
        if let Some(job) = self.history.iter_mut().rev().find(|job| job.seq == seq) {
            job.state = failed;
        }
        Some(seq)
    }

    /// Return to `Idle` after a finished job has been reported.
    pub fn acknowledge(&mut self) {
        if !self.is_running() {
            self.current = None;
        }
    }

    pub fn state(&self) -> JobState {
        self.current
            .as_ref()
            .map_or(JobState::Idle, |job| job.state.clone())
    }

    pub fn is_running(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|job| job.state == JobState::Running)
    }

    pub fn current(&self) -> Option<&TransformJob> {
        self.current.as_ref()
    }

    pub fn latest_seq(&self) -> JobSeq {
        self.latest_seq
    }

    pub fn active_media(&self) -> Option<&MediaRef> {
        self.active_media.as_ref()
    }

    /// Finished and cancelled jobs, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &TransformJob> + '_ {
        self.history.iter()
    }

    fn cancel_running(&mut self) -> Option<JobSeq> {
        let job = self.current.as_mut().filter(|job| job.state == JobState::Running)?;
        job.finish(JobState::Cancelled);
        let seq = job.seq;
        tracing::info!(seq, "Running transform job superseded");
        let cancelled = job.clone();
        self.record(cancelled);
        Some(seq)
    }

    fn record(&mut self, job: TransformJob) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelsync_media_model::TransformOp;

    fn request(effect: &str, resume: f64) -> TransformRequest {
        TransformRequest {
            effect: effect.to_string(),
            source: MediaRef::new("/videos/clip.mp4"),
            resume_position: resume,
        }
    }

    fn gray() -> TransformDescription {
        TransformDescription::single(TransformOp::Grayscale)
    }

    fn manager() -> TransformJobManager {
        let mut jobs = TransformJobManager::new();
        jobs.set_source(MediaRef::new("/videos/clip.mp4"));
        jobs
    }

    #[test]
    fn test_submit_then_success_swaps_media() {
        let mut jobs = manager();
        let ticket = jobs.submit(request("Grayscale", 6.4), gray()).ticket.unwrap();
        assert_eq!(jobs.state(), JobState::Running);

        let done = jobs.complete(ticket.seq, Ok(MediaRef::new("/cache/gray.mp4")));
        assert_eq!(
            done,
            Completion::Applied {
                seq: ticket.seq,
                media: MediaRef::new("/cache/gray.mp4"),
                resume_position: 6.4,
            }
        );
        assert_eq!(jobs.active_media().unwrap().as_str(), "/cache/gray.mp4");
        assert_eq!(jobs.state(), JobState::Succeeded(MediaRef::new("/cache/gray.mp4")));

        jobs.acknowledge();
        assert_eq!(jobs.state(), JobState::Idle);
    }

    #[test]
    fn test_last_request_wins() {
        let mut jobs = manager();
        let a = jobs.submit(request("A", 1.0), gray()).ticket.unwrap();
        let outcome = jobs.submit(request("B", 2.0), gray());
        assert_eq!(outcome.superseded, Some(a.seq));
        let b = outcome.ticket.unwrap();
        assert!(b.seq > a.seq);

        assert_eq!(
            jobs.complete(a.seq, Ok(MediaRef::new("/cache/a.mp4"))),
            Completion::Discarded { seq: a.seq }
        );
        assert_eq!(jobs.active_media().unwrap().as_str(), "/videos/clip.mp4");

        jobs.complete(b.seq, Ok(MediaRef::new("/cache/b.mp4")));
        assert_eq!(jobs.active_media().unwrap().as_str(), "/cache/b.mp4");
    }

    #[test]
    fn test_failure_keeps_previous_media() {
        let mut jobs = manager();
        let t = jobs.submit(request("Sepia", 0.0), gray()).ticket.unwrap();
        let done = jobs.complete(t.seq, Err(JobFailure::ExecutionFailed("exit 1".into())));
        assert!(matches!(done, Completion::Failed { reason: JobFailure::ExecutionFailed(_), .. }));
        assert_eq!(jobs.active_media().unwrap().as_str(), "/videos/clip.mp4");
        assert!(matches!(jobs.state(), JobState::Failed(_)));
    }

    #[test]
    fn test_executor_cancel_marks_cancelled() {
        let mut jobs = manager();
        let t = jobs.submit(request("Sepia", 0.0), gray()).ticket.unwrap();
        jobs.complete(t.seq, Err(JobFailure::Cancelled));
        assert_eq!(jobs.state(), JobState::Cancelled);
    }

    #[test]
    fn test_identity_submit_supersedes_without_ticket() {
        let mut jobs = manager();
        let t = jobs.submit(request("Vivid", 0.0), gray()).ticket.unwrap();
        let outcome = jobs.submit(request("Normal", 0.0), TransformDescription::identity());
        assert!(outcome.ticket.is_none());
        assert_eq!(outcome.superseded, Some(t.seq));
        assert_eq!(jobs.state(), JobState::Idle);

        assert_eq!(
            jobs.complete(t.seq, Ok(MediaRef::new("/cache/vivid.mp4"))),
            Completion::Discarded { seq: t.seq }
        );
        assert_eq!(jobs.active_media().unwrap().as_str(), "/videos/clip.mp4");
    }

    #[test]
    fn test_new_source_supersedes_running_job() {
        let mut jobs = manager();
        let t = jobs.submit(request("Invert", 0.0), gray()).ticket.unwrap();
        assert_eq!(jobs.set_source(MediaRef::new("/videos/other.mp4")), Some(t.seq));
        assert!(matches!(
            jobs.complete(t.seq, Ok(MediaRef::new("/cache/x.mp4"))),
            Completion::Discarded { .. }
        ));
        assert_eq!(jobs.active_media().unwrap().as_str(), "/videos/other.mp4");
    }

    #[test]
    fn test_duplicate_completion_is_discarded() {
        let mut jobs = manager();
        let t = jobs.submit(request("Invert", 0.0), gray()).ticket.unwrap();
        jobs.complete(t.seq, Ok(MediaRef::new("/cache/1.mp4")));
        assert!(matches!(
            jobs.complete(t.seq, Ok(MediaRef::new("/cache/2.mp4"))),
            Completion::Discarded { .. }
        ));
        assert_eq!(jobs.active_media().unwrap().as_str(), "/cache/1.mp4");
    }

    #[test]
    fn test_unloadable_result_restores_previous_media() {
        let mut jobs = manager();
        let t = jobs.submit(request("Invert", 2.0), gray()).ticket.unwrap();
        jobs.complete(t.seq, Ok(MediaRef::new("/cache/inv.missing")));

        let reason = JobFailure::ExecutionFailed("cannot open result".into());
        assert_eq!(jobs.revert_result(&MediaRef::new("/cache/other.mp4"), reason.clone()), None);
        assert_eq!(
            jobs.revert_result(&MediaRef::new("/cache/inv.missing"), reason.clone()),
            Some(t.seq)
        );
        assert_eq!(jobs.active_media().unwrap().as_str(), "/videos/clip.mp4");
        assert_eq!(jobs.state(), JobState::Failed(reason.clone()));
        assert_eq!(jobs.history().last().unwrap().state, JobState::Failed(reason.clone()));

        // Only the most recent swap can be undone.
        assert_eq!(jobs.revert_result(&MediaRef::new("/videos/clip.mp4"), reason), None);
        assert_eq!(jobs.active_media().unwrap().as_str(), "/videos/clip.mp4");
    }

    #[test]
    fn test_loaded_result_is_kept() {
        let mut jobs = manager();
        let t = jobs.submit(request("Invert", 0.0), gray()).ticket.unwrap();
        jobs.complete(t.seq, Ok(MediaRef::new("/cache/inv.mp4")));
        jobs.result_loaded(&MediaRef::new("/cache/inv.mp4"));

        let reason = JobFailure::ExecutionFailed("late".into());
        assert_eq!(jobs.revert_result(&MediaRef::new("/cache/inv.mp4"), reason), None);
        assert_eq!(jobs.active_media().unwrap().as_str(), "/cache/inv.mp4");
    }

    #[test]
    fn test_history_is_bounded() {
        let mut jobs = manager();
        for i in 0..(HISTORY_CAPACITY + 4) {
            jobs.submit(request(&format!("E{i}"), 0.0), gray());
        }
        // Every submission but the last was cancelled.
        assert_eq!(jobs.history().count(), HISTORY_CAPACITY);
        let first = jobs.history().next().unwrap();
        assert_eq!(first.request.effect, "E3");
        assert!(jobs.history().all(|j| j.finished_at.is_some()));
    }
}
