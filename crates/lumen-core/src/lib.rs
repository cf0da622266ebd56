//! Lumen Core - batch image conversion library.
//!
//! Lumen takes arbitrary file and directory paths, registers the eligible
//! images as jobs, and converts them one at a time into a chosen output
//! format while streaming per-job progress events to the caller.
//!
//! # Architecture
//!
//! ```text
//! Inputs → Scan (classify + dedup) → Job registry → Sequential runner
//!                                                        │
//!                              Converter (decode → orient → encode)
//!                                                        │
//!                                   Progress events + run summary
//! ```
//!
//! Conversion is strictly sequential: one decode+encode cycle in flight at
//! any time, with all buffers released between jobs. That is the memory
//! bound that lets a run chew through arbitrarily many large RAW files.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lumen_core::{Config, Lumen, OutputFormat, RunEvent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let lumen = Lumen::new(Config::load()?);
//!     let report = lumen.add_inputs(&["./photos".into()])?;
//!     println!("queued {} files", report.added);
//!
//!     let mut run = lumen.start_run("./converted".as_ref(), OutputFormat::Jpeg)?;
//!     while let Some(event) = run.recv().await {
//!         if let RunEvent::Completed(summary) = event {
//!             println!("{} ok, {} failed", summary.succeeded, summary.failed);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod registry;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, ConvertError, LumenError, Result, RunError};
pub use format::{EncodeSettings, OutputFormat};
pub use pipeline::{ImageConverter, IntakeScanner, PipelineRunner};
pub use registry::JobRegistry;
pub use types::{IntakeReport, Job, JobId, JobStatus, ProgressEvent, RunEvent, RunSummary};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use registry::lock_registry;
use tokio::sync::mpsc;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The collaborator-facing entry point: intake, run control, observation.
///
/// Intake and runs are mutually exclusive. While a run is active,
/// `add_inputs` and `clear_all` fail with [`RunError::InvalidState`] and a
/// second [`Lumen::start_run`] fails with [`RunError::AlreadyRunning`];
/// within a run only the runner task mutates the registry. That
/// single-writer discipline is the whole concurrency model — no further
/// locking is needed.
pub struct Lumen {
    config: Config,
    registry: Arc<Mutex<JobRegistry>>,
    run_active: Arc<AtomicBool>,
}

impl Lumen {
    /// Create a new instance with the given configuration.
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing Lumen v{}", VERSION);
        Self {
            config,
            registry: Arc::new(Mutex::new(JobRegistry::new())),
            run_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scan input paths and register the eligible, not-yet-known images.
    ///
    /// Nonexistent paths and ineligible file types are skipped silently;
    /// the report's `added`/`total` delta is the only trace of skips.
    pub fn add_inputs(&self, paths: &[PathBuf]) -> std::result::Result<IntakeReport, RunError> {
        if self.run_active.load(Ordering::SeqCst) {
            return Err(RunError::InvalidState("add_inputs"));
        }
        let mut registry = lock_registry(&self.registry);
        let existing = registry.known_paths();
        let jobs = IntakeScanner::scan(paths, &existing);
        let added = jobs.len();
        registry.append(jobs);
        let total = registry.len();
        tracing::debug!(added, total, "intake complete");
        Ok(IntakeReport { added, total })
    }

    /// Remove all registered jobs and reset the aggregate counters.
    pub fn clear_all(&self) -> std::result::Result<(), RunError> {
        if self.run_active.load(Ordering::SeqCst) {
            return Err(RunError::InvalidState("clear_all"));
        }
        lock_registry(&self.registry).clear();
        Ok(())
    }

    /// Number of registered jobs.
    pub fn job_count(&self) -> usize {
        lock_registry(&self.registry).len()
    }

    /// Snapshot of all jobs in registration order.
    pub fn jobs(&self) -> Vec<Job> {
        lock_registry(&self.registry).jobs().to_vec()
    }

    /// Current status of a job, if registered.
    pub fn status_of(&self, id: JobId) -> Option<JobStatus> {
        lock_registry(&self.registry).status_of(id)
    }

    /// Whether a conversion run is currently active.
    pub fn is_running(&self) -> bool {
        self.run_active.load(Ordering::SeqCst)
    }

    /// Start converting every registered job into `dest_dir`.
    ///
    /// Fails with [`RunError::AlreadyRunning`] while a run is active (the
    /// active run is left untouched) and with [`RunError::NothingToDo`]
    /// when no jobs are registered — checked before any state change, so
    /// no events are emitted either way.
    ///
    /// Must be called within a Tokio runtime; the run executes on a
    /// spawned task and reports through the returned [`RunHandle`].
    pub fn start_run(
        &self,
        dest_dir: &Path,
        format: OutputFormat,
    ) -> std::result::Result<RunHandle, RunError> {
        if self
            .run_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(RunError::AlreadyRunning);
        }
        if lock_registry(&self.registry).is_empty() {
            self.run_active.store(false, Ordering::SeqCst);
            return Err(RunError::NothingToDo);
        }

        let (tx, rx) = mpsc::channel(self.config.pipeline.event_buffer_size);
        let runner = PipelineRunner::new(&self.config);
        let registry = Arc::clone(&self.registry);
        let run_active = Arc::clone(&self.run_active);
        let dest_dir = dest_dir.to_path_buf();

        tokio::spawn(async move {
            runner.run(registry, &dest_dir, format, &tx).await;
            run_active.store(false, Ordering::SeqCst);
        });

        Ok(RunHandle { events: rx })
    }
}

/// Receiving side of one run's event stream.
///
/// Yields a [`RunEvent::Progress`] per job status transition and a final
/// [`RunEvent::Completed`]; `None` after the stream closes.
pub struct RunHandle {
    events: mpsc::Receiver<RunEvent>,
}

impl RunHandle {
    /// Receive the next event, or `None` when the run is over.
    pub async fn recv(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Unwrap the underlying channel receiver.
    pub fn into_events(self) -> mpsc::Receiver<RunEvent> {
        self.events
    }
}
