//! Executors that do not touch the filesystem.
//!
//! Used by `reelsync simulate` and by tests that need predictable job
//! outcomes.

use std::time::Duration;

use async_trait::async_trait;

use reelsync_common::error::JobFailure;
use reelsync_media_model::{MediaRef, TransformDescription};
use reelsync_sync_engine::TransformExecutor;

/// Succeeds after an optional delay with a derived media reference.
///
/// The result is `<stem>+<op>+<op>.sim`, so distinct descriptions give
/// distinct references.
#[derive(Debug, Clone, Default)]
pub struct InstantExecutor {
    latency: Duration,
}

impl InstantExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }

    /// Reference this executor returns for `source` and `description`.
    pub fn result_for(source: &MediaRef, description: &TransformDescription) -> MediaRef {
        let stem = source.stem().unwrap_or("media");
        let mut name = stem.to_string();
        for op in description.op_names() {
            name.push('+');
            name.push_str(op);
        }
        MediaRef::new(format!("{name}.sim"))
    }
}

#[async_trait]
impl TransformExecutor for InstantExecutor {
    async fn execute(
        &self,
        source: &MediaRef,
        description: &TransformDescription,
    ) -> Result<MediaRef, JobFailure> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(Self::result_for(source, description))
    }

    fn name(&self) -> &str {
        "instant"
    }
}

/// Always fails with the configured message.
#[derive(Debug, Clone)]
pub struct FailingExecutor {
    message: String,
}

impl FailingExecutor {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl TransformExecutor for FailingExecutor {
    async fn execute(
        &self,
        _source: &MediaRef,
        _description: &TransformDescription,
    ) -> Result<MediaRef, JobFailure> {
        Err(JobFailure::ExecutionFailed(self.message.clone()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
