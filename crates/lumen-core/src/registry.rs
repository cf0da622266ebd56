//! The ordered collection of conversion jobs.
//!
//! Insertion order is processing order. The registry is a plain collection:
//! run/intake mutual exclusion is enforced by the `Lumen` facade, which
//! guarantees a single writer at any point in a run's lifecycle.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::types::{Job, JobId, JobStatus, RunSummary};

/// Ordered, append-only (between clears) registry of jobs.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Vec<Job>,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append jobs in discovery order.
    ///
    /// Callers guarantee the jobs are already deduplicated against
    /// `known_paths()`; duplicates are a contract violation.
    pub fn append(&mut self, jobs: Vec<Job>) {
        debug_assert!(
            {
                let known = self.known_paths();
                jobs.iter().all(|j| !known.contains(&j.source_path))
            },
            "duplicate source path appended to registry"
        );
        self.jobs.extend(jobs);
    }

    /// Remove all jobs. Aggregate counters are derived from job statuses,
    /// so clearing resets them as well.
    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// All jobs, in registration order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Iterate jobs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Canonicalized source paths of all registered jobs (the dedup set).
    pub fn known_paths(&self) -> HashSet<PathBuf> {
        self.jobs.iter().map(|j| j.source_path.clone()).collect()
    }

    /// Current status of a job, if registered.
    pub fn status_of(&self, id: JobId) -> Option<JobStatus> {
        self.jobs.iter().find(|j| j.id == id).map(|j| j.status)
    }

    /// Advance a job's status.
    ///
    /// Transitions must follow `Pending → Queued → Processing → terminal`.
    /// An out-of-order transition is a programming-contract violation:
    /// it panics in debug builds and is logged and ignored in release.
    pub fn set_status(&mut self, id: JobId, status: JobStatus) {
        let Some(job) = self.jobs.iter_mut().find(|j| j.id == id) else {
            debug_assert!(false, "set_status on unknown job {id}");
            tracing::error!(%id, "set_status on unknown job");
            return;
        };
        if !job.status.can_advance_to(status) {
            debug_assert!(
                false,
                "invalid status transition {} -> {} for job {id}",
                job.status, status
            );
            tracing::error!(%id, from = %job.status, to = %status, "invalid status transition");
            return;
        }
        job.status = status;
    }

    /// Aggregate counters derived from current job statuses.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.jobs.len(),
            succeeded: self
                .jobs
                .iter()
                .filter(|j| j.status == JobStatus::Succeeded)
                .count(),
            failed: self
                .jobs
                .iter()
                .filter(|j| j.status == JobStatus::Failed)
                .count(),
        }
    }
}

/// Lock a shared registry, recovering the guard if a prior holder panicked.
pub(crate) fn lock_registry(
    registry: &std::sync::Mutex<JobRegistry>,
) -> std::sync::MutexGuard<'_, JobRegistry> {
    registry
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
