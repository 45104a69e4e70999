//! Core data model: `Document`, `ChangeEvent`, `PendingDelete`, and the
//! extraction result types.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// One record per indexed file. `path` is the unique key - re-indexing an
/// existing path is always delete-by-term then add, never an in-place
/// mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub path: String,
    pub relative_path: String,
    pub filename: String,
    pub extension: String,
    pub size: u64,
    pub last_modified: u64,
    pub content: String,
    /// Each path segment, tokenized separately for directory-scoped search.
    pub path_components: Vec<String>,
    pub extracted_types: Vec<crate::extractors::ExtractedType>,
}

impl Document {
    pub fn path_component_text(&self) -> String {
        self.path_components.join(" ")
    }
}

/// Kind of change observed by the watcher. Renames are decomposed into a
/// delete of the old path and a create of the new one before they ever
/// reach the pipeline's event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub workspace: PathBuf,
    pub kind: ChangeKind,
    /// Milliseconds since the epoch - coarser-than-millisecond precision
    /// would make the atomic-write coalescing window meaningless.
    pub timestamp: u64,
}

impl ChangeEvent {
    pub fn new(path: PathBuf, workspace: PathBuf, kind: ChangeKind, timestamp: u64) -> Self {
        Self {
            path,
            workspace,
            kind,
            timestamp,
        }
    }
}

/// Exists only while a delete is being verified against the filesystem.
#[derive(Debug, Clone)]
pub struct PendingDelete {
    pub path: PathBuf,
    pub first_seen_time: SystemTime,
    pub last_activity_time: SystemTime,
    pub cancelled: bool,
}

impl PendingDelete {
    pub fn new(path: PathBuf, now: SystemTime) -> Self {
        Self {
            path,
            first_seen_time: now,
            last_activity_time: now,
            cancelled: false,
        }
    }

    pub fn refresh(&mut self, now: SystemTime) {
        self.last_activity_time = now;
        self.cancelled = false;
    }

    pub fn is_quiet(&self, now: SystemTime, quiet_period: std::time::Duration) -> bool {
        now.duration_since(self.last_activity_time)
            .map(|elapsed| elapsed >= quiet_period)
            .unwrap_or(false)
    }
}

/// Current epoch seconds, used for `Document::last_modified` and metadata
/// timestamps throughout the crate.
pub fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Epoch milliseconds, used for `ChangeEvent::timestamp`.
pub fn now_epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub fn file_mtime_epoch_secs(path: &Path) -> std::io::Result<u64> {
    let metadata = std::fs::metadata(path)?;
    let modified = metadata.modified()?;
    Ok(modified
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn pending_delete_quiet_after_configured_period() {
        let now = SystemTime::now();
        let pending = PendingDelete {
            path: PathBuf::from("/tmp/a.rs"),
            first_seen_time: now,
            last_activity_time: now - Duration::from_secs(10),
            cancelled: false,
        };
        assert!(pending.is_quiet(now, Duration::from_secs(5)));
        assert!(!pending.is_quiet(now, Duration::from_secs(20)));
    }

    #[test]
    fn refresh_clears_cancelled_and_bumps_activity() {
        let now = SystemTime::now();
        let mut pending = PendingDelete::new(PathBuf::from("/tmp/a.rs"), now);
        pending.cancelled = true;
        let later = now + Duration::from_secs(1);
        pending.refresh(later);
        assert!(!pending.cancelled);
        assert_eq!(pending.last_activity_time, later);
    }
}
