//! Intake scanning: expand inputs into deduplicated, eligible jobs.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::types::Job;

use super::classify;

/// Expands a list of arbitrary input paths into conversion jobs.
pub struct IntakeScanner;

impl IntakeScanner {
    /// Scan input paths (files and/or directories) into new `Pending` jobs.
    ///
    /// Intake is best-effort: nonexistent inputs and ineligible files are
    /// skipped silently. Directories are expanded one level only; hidden
    /// entries are excluded. The dedup key is the canonicalized path,
    /// checked against `existing` and against earlier results of this call.
    /// Output preserves discovery order: outer input order, then
    /// directory-enumeration order.
    pub fn scan(inputs: &[PathBuf], existing: &HashSet<PathBuf>) -> Vec<Job> {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut jobs = Vec::new();

        for input in inputs {
            let Ok(canonical) = std::fs::canonicalize(input) else {
                tracing::debug!(path = ?input, "skipping nonexistent input");
                continue;
            };

            if canonical.is_dir() {
                // One level only; enumeration failures degrade to "no entries"
                for entry in WalkDir::new(&canonical)
                    .min_depth(1)
                    .max_depth(1)
                    .follow_links(true)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                {
                    if is_hidden(entry.file_name()) {
                        continue;
                    }
                    let path = entry.path();
                    if !path.is_file() || !classify::is_eligible(path) {
                        continue;
                    }
                    // Canonicalize the child too so symlinked entries dedup
                    // against their targets
                    let Ok(child) = std::fs::canonicalize(path) else {
                        continue;
                    };
                    push_unique(&mut jobs, &mut seen, existing, child);
                }
            } else if canonical.is_file() && classify::is_eligible(&canonical) {
                push_unique(&mut jobs, &mut seen, existing, canonical);
            }
        }

        jobs
    }
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_str().map(|n| n.starts_with('.')).unwrap_or(false)
}

fn push_unique(
    jobs: &mut Vec<Job>,
    seen: &mut HashSet<PathBuf>,
    existing: &HashSet<PathBuf>,
    path: PathBuf,
) {
    if existing.contains(&path) || !seen.insert(path.clone()) {
        return;
    }
    jobs.push(Job::new(path));
}
