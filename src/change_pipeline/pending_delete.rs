//! Tracks paths seen as deleted until a quiet period has passed, so an
//! atomic-write editor's delete+recreate never reaches the index as a
//! spurious removal.
//!
//! `julie::watcher` applies deletes the moment it sees them; the
//! quiet-period verification here exists to absorb editors that delete and
//! recreate a file on every save (see DESIGN.md for where this comes from).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::document::PendingDelete;

/// Concurrent map of paths awaiting delete verification, keyed by path.
#[derive(Default)]
pub struct PendingDeleteMap {
    entries: HashMap<PathBuf, PendingDelete>,
}

impl PendingDeleteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a deletion observation, refreshing an existing entry's
    /// activity time rather than resetting its first-seen time.
    pub fn mark_deleted(&mut self, path: &Path, now: SystemTime) {
        match self.entries.get_mut(path) {
            Some(existing) => existing.refresh(now),
            None => {
                self.entries.insert(path.to_path_buf(), PendingDelete::new(path.to_path_buf(), now));
            }
        }
    }

    /// Cancels a pending delete because the path was just created or
    /// modified again; leaves no trace if none was pending.
    pub fn cancel(&mut self, path: &Path) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.cancelled = true;
        }
    }

    /// Removes every entry whose quiet period has elapsed. Cancelled
    /// entries are dropped silently; the rest are returned for filesystem
    /// re-verification. Entries still within their quiet window are left
    /// untouched either way.
    pub fn drain_quiet(&mut self, now: SystemTime, quiet_period: Duration) -> Vec<PendingDelete> {
        let due: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_quiet(now, quiet_period))
            .map(|(path, _)| path.clone())
            .collect();

        due.into_iter()
            .filter_map(|path| self.entries.remove(&path))
            .filter(|entry| !entry.cancelled)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_entries_are_dropped_without_action() {
        let mut map = PendingDeleteMap::new();
        let now = SystemTime::now();
        map.mark_deleted(Path::new("/a.rs"), now - Duration::from_secs(10));
        map.cancel(Path::new("/a.rs"));

        let due = map.drain_quiet(now, Duration::from_secs(5));
        assert!(due.is_empty());
        assert!(map.is_empty());
    }

    #[test]
    fn quiet_entries_are_returned_and_removed() {
        let mut map = PendingDeleteMap::new();
        let now = SystemTime::now();
        map.mark_deleted(Path::new("/a.rs"), now - Duration::from_secs(10));

        let due = map.drain_quiet(now, Duration::from_secs(5));
        assert_eq!(due.len(), 1);
        assert!(map.is_empty());
    }

    #[test]
    fn repeated_delete_refreshes_activity_without_resetting_first_seen() {
        let mut map = PendingDeleteMap::new();
        let first = SystemTime::now() - Duration::from_secs(20);
        map.mark_deleted(Path::new("/a.rs"), first);
        let second = first + Duration::from_secs(5);
        map.mark_deleted(Path::new("/a.rs"), second);

        let entry = map.entries.get(Path::new("/a.rs")).unwrap();
        assert_eq!(entry.first_seen_time, first);
        assert_eq!(entry.last_activity_time, second);
    }
}
