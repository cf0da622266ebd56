//! Sequential run orchestration.
//!
//! One converter invocation at a time, strictly in registration order; a
//! failed job never aborts the run and there is no per-job retry.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::config::Config;
use crate::format::OutputFormat;
use crate::registry::{lock_registry, JobRegistry};
use crate::types::{JobId, JobStatus, ProgressEvent, RunEvent, RunSummary};

use super::convert::ImageConverter;

/// Drives the job registry through the converter and reports progress.
pub struct PipelineRunner {
    converter: ImageConverter,
}

impl PipelineRunner {
    /// Create a new runner with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            converter: ImageConverter::new(config.limits.clone()),
        }
    }

    /// Process every registered job, in registration order.
    ///
    /// Per job: `Queued`, `Processing`, one converter call, then the
    /// terminal status — with a progress event after each transition.
    /// Emits `Completed(RunSummary)` after the last job.
    pub async fn run(
        &self,
        registry: Arc<Mutex<JobRegistry>>,
        dest_dir: &Path,
        format: OutputFormat,
        events: &mpsc::Sender<RunEvent>,
    ) -> RunSummary {
        let queue: Vec<(JobId, PathBuf, String)> = lock_registry(&registry)
            .iter()
            .map(|j| (j.id, j.source_path.clone(), j.file_name.clone()))
            .collect();
        let total = queue.len();
        tracing::info!(total, %format, dest = ?dest_dir, "starting conversion run");

        let mut summary = RunSummary {
            total,
            succeeded: 0,
            failed: 0,
        };

        for (index, (id, source, file_name)) in queue.into_iter().enumerate() {
            let event = |status, completed| ProgressEvent {
                job_id: id,
                file_name: file_name.clone(),
                status,
                completed,
                total,
            };

            self.advance(&registry, events, event(JobStatus::Queued, index))
                .await;
            self.advance(&registry, events, event(JobStatus::Processing, index))
                .await;

            let status = match self.converter.convert(&source, dest_dir, format).await {
                Ok(dest) => {
                    summary.succeeded += 1;
                    tracing::debug!(source = ?source, dest = ?dest, "converted");
                    JobStatus::Succeeded
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(source = ?source, "conversion failed: {e}");
                    JobStatus::Failed
                }
            };
            self.advance(&registry, events, event(status, index + 1)).await;
        }

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "run complete"
        );
        let _ = events.send(RunEvent::Completed(summary)).await;
        summary
    }

    /// Record a status transition and notify the collaborator.
    ///
    /// The awaited send on the bounded channel is the run's only
    /// suspension point: every event for job *i* is queued before job
    /// *i + 1* starts. A dropped receiver is not a cancellation signal;
    /// the run always processes every job.
    async fn advance(
        &self,
        registry: &Arc<Mutex<JobRegistry>>,
        events: &mpsc::Sender<RunEvent>,
        event: ProgressEvent,
    ) {
        lock_registry(registry).set_status(event.job_id, event.status);
        let _ = events.send(RunEvent::Progress(event)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Job;
    use image::Rgb;

    #[tokio::test]
    async fn test_single_job_event_sequence() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("shot.png");
        image::RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]))
            .save(&source)
            .unwrap();

        let mut registry = JobRegistry::new();
        registry.append(vec![Job::new(source)]);
        let registry = Arc::new(Mutex::new(registry));

        let (tx, mut rx) = mpsc::channel(16);
        let runner = PipelineRunner::new(&Config::default());
        let summary = runner
            .run(Arc::clone(&registry), dest_dir.path(), OutputFormat::Jpeg, &tx)
            .await;
        drop(tx);

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 0);

        let mut statuses = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                RunEvent::Progress(p) => statuses.push(p.status),
                RunEvent::Completed(s) => assert_eq!(s, summary),
            }
        }
        assert_eq!(
            statuses,
            [JobStatus::Queued, JobStatus::Processing, JobStatus::Succeeded]
        );
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_stop_run() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        for name in ["a.png", "b.png"] {
            image::RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]))
                .save(src_dir.path().join(name))
                .unwrap();
        }

        let mut registry = JobRegistry::new();
        registry.append(vec![
            Job::new(src_dir.path().join("a.png")),
            Job::new(src_dir.path().join("b.png")),
        ]);
        let registry = Arc::new(Mutex::new(registry));

        let (tx, rx) = mpsc::channel(16);
        drop(rx);

        let runner = PipelineRunner::new(&Config::default());
        let summary = runner
            .run(registry, dest_dir.path(), OutputFormat::Png, &tx)
            .await;
        assert_eq!(summary.succeeded, 2);
    }
}
