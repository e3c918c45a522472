//! Run report and counters.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{WalkWarning, WarningKind};

/// Summary of one filtered copy run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopyReport {
    /// Directories reached by the walk (admitted or pruned).
    pub dirs_visited: u64,
    /// Directories copied and entered.
    pub dirs_admitted: u64,
    /// Directories whose subtree was skipped.
    pub dirs_pruned: u64,
    /// Files reached inside admitted directories.
    pub files_seen: u64,
    /// Files copied (or planned, for a dry run).
    pub files_copied: u64,
    /// Files left behind because their name did not match.
    pub files_skipped: u64,
    /// Candidate files whose copy failed.
    #[serde(default)]
    pub files_failed: u64,
    /// Bytes written to the target.
    pub bytes_copied: u64,
    /// Candidate files whose metadata could not be read.
    pub metadata_failures: u64,
    /// Paths that a dry run would have created.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub planned: Vec<PathBuf>,
    /// Non-fatal problems, in the order they happened.
    pub warnings: Vec<WalkWarning>,
    /// Wall time of the walk.
    pub elapsed: Duration,
}

impl CopyReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a directory decision.
    pub fn record_dir(&mut self, admitted: bool) {
        self.dirs_visited += 1;
        if admitted {
            self.dirs_admitted += 1;
        } else {
            self.dirs_pruned += 1;
        }
    }

    /// Record a file reached inside an admitted directory.
    pub fn record_file(&mut self, copied: bool) {
        self.files_seen += 1;
        if copied {
            self.files_copied += 1;
        } else {
            self.files_skipped += 1;
        }
    }

    /// Record a candidate file that could not be copied.
    pub fn record_file_failed(&mut self) {
        self.files_seen += 1;
        self.files_failed += 1;
    }

    /// Add copied bytes.
    pub fn add_bytes(&mut self, bytes: u64) {
        self.bytes_copied += bytes;
    }

    /// Record a path a dry run would create.
    pub fn record_planned(&mut self, path: PathBuf) {
        self.planned.push(path);
    }

    /// Add a warning.
    pub fn warn(&mut self, warning: WalkWarning) {
        if warning.kind == WarningKind::MetadataError {
            self.metadata_failures += 1;
        }
        self.warnings.push(warning);
    }

    /// Number of warnings of a given kind.
    pub fn count_kind(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}

impl std::fmt::Display for CopyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "dirs visited={} admitted={} pruned={} files seen={} copied={} skipped={} failed={} warnings={}",
            self.dirs_visited,
            self.dirs_admitted,
            self.dirs_pruned,
            self.files_seen,
            self.files_copied,
            self.files_skipped,
            self.files_failed,
            self.warnings.len()
        )
    }
}
