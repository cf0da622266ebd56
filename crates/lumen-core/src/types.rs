//! Core data types for the Lumen conversion pipeline.
//!
//! Jobs, their status state machine, and the event types streamed back to
//! the collaborator during a run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique job identifier.
///
/// Allocated from a monotonic counter; an id is never reused within one
/// process, even across registry clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(u64);

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

impl JobId {
    /// Allocate the next job id.
    pub fn next() -> Self {
        JobId(NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value, for display.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle status of a single job.
///
/// Transitions are forward-only: `Pending → Queued → Processing` and then
/// exactly one of the terminal states. Terminal states never change except
/// by a full registry clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Queued,
    Processing,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Whether this status permits advancing to `next`.
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Queued) | (Queued, Processing) | (Processing, Succeeded) | (Processing, Failed)
        )
    }

    /// Whether this is a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One unit of conversion work: a canonicalized source path plus tracked
/// status. The path is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Stable, process-unique identity
    pub id: JobId,

    /// Absolute, canonicalized source path (the dedup key)
    pub source_path: PathBuf,

    /// Just the filename portion, cached for progress events
    pub file_name: String,

    /// Current lifecycle status
    pub status: JobStatus,
}

impl Job {
    /// Create a new `Pending` job for a canonicalized source path.
    pub fn new(source_path: PathBuf) -> Self {
        let file_name = source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Self {
            id: JobId::next(),
            source_path,
            file_name,
            status: JobStatus::Pending,
        }
    }
}

/// Result of one intake call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeReport {
    /// Jobs added by this call
    pub added: usize,

    /// Jobs now registered in total
    pub total: usize,
}

/// Per-transition progress notification.
///
/// `completed / total` is the progress fraction; `completed` only advances
/// when a job reaches a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub job_id: JobId,
    pub file_name: String,
    pub status: JobStatus,
    pub completed: usize,
    pub total: usize,
}

/// Aggregate counters for one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total jobs in the run
    pub total: usize,

    /// Jobs that converted successfully
    pub succeeded: usize,

    /// Jobs that failed
    pub failed: usize,
}

/// Tagged union streamed to the collaborator during a run.
/// Internally tagged: `{"type":"progress",...}` or `{"type":"completed",...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RunEvent {
    Progress(ProgressEvent),
    Completed(RunSummary),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_job_ids_unique_and_increasing() {
        let a = JobId::next();
        let b = JobId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_job_new_is_pending() {
        let job = Job::new(PathBuf::from("/photos/dsc_0001.nef"));
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.file_name, "dsc_0001.nef");
    }

    #[test]
    fn test_status_forward_transitions() {
        use JobStatus::*;
        assert!(Pending.can_advance_to(Queued));
        assert!(Queued.can_advance_to(Processing));
        assert!(Processing.can_advance_to(Succeeded));
        assert!(Processing.can_advance_to(Failed));
    }

    #[test]
    fn test_status_rejects_backward_and_skipping() {
        use JobStatus::*;
        assert!(!Pending.can_advance_to(Processing));
        assert!(!Pending.can_advance_to(Succeeded));
        assert!(!Queued.can_advance_to(Pending));
        assert!(!Queued.can_advance_to(Succeeded));
        assert!(!Processing.can_advance_to(Queued));
        assert!(!Succeeded.can_advance_to(Failed));
        assert!(!Failed.can_advance_to(Succeeded));
        assert!(!Succeeded.can_advance_to(Succeeded));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn test_run_event_progress_roundtrip() {
        let event = RunEvent::Progress(ProgressEvent {
            job_id: JobId::next(),
            file_name: "beach.cr2".to_string(),
            status: JobStatus::Processing,
            completed: 2,
            total: 5,
        });
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains("\"type\":\"progress\""));
        assert!(json.contains("\"status\":\"processing\""));

        let parsed: RunEvent = serde_json::from_str(&json).unwrap();
        match parsed {
            RunEvent::Progress(p) => {
                assert_eq!(p.file_name, "beach.cr2");
                assert_eq!(p.completed, 2);
                assert_eq!(p.total, 5);
            }
            _ => panic!("Expected Progress variant"),
        }
    }

    #[test]
    fn test_run_event_completed_roundtrip() {
        let event = RunEvent::Completed(RunSummary {
            total: 5,
            succeeded: 4,
            failed: 1,
        });
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains("\"type\":\"completed\""));
        assert!(json.contains("\"succeeded\":4"));

        let parsed: RunEvent = serde_json::from_str(&json).unwrap();
        match parsed {
            RunEvent::Completed(s) => assert_eq!(s.failed, 1),
            _ => panic!("Expected Completed variant"),
        }
    }
}
