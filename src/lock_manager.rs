//! Tiered startup cleanup of stale writer locks.
//!
//! Three independent tiers run once at startup; a failure in one does not
//! abort the others, mirroring how `julie::workspace::registry_service` runs
//! its own cleanup passes - orphan detection, size limits, expiry - each
//! wrapped so one failing tier doesn't sink the rest.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use fs4::fs_std::FileExt;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::LockManagerConfig;

const WRITE_LOCK_FILENAME: &str = "write.lock";

/// Result of one LockManager sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub test_artifacts_removed: usize,
    pub workspace_locks_removed: usize,
    pub stuck_locks_found: usize,
    pub diagnostics: Vec<StuckLockDiagnostic>,
}

/// A tier-3 diagnostic record for a lock neither tier removed.
#[derive(Debug, Clone)]
pub struct StuckLockDiagnostic {
    pub path: PathBuf,
    pub workspace_label: String,
    pub age: Duration,
    pub size_bytes: u64,
    pub accessible: bool,
}

/// Segments that mark a lock as a disposable test artifact (tier 1).
const TEST_ARTIFACT_SEGMENTS: &[&str] = &["bin/debug", "bin/release", "testprojects"];

pub struct LockManager {
    config: LockManagerConfig,
}

impl LockManager {
    pub fn new(config: LockManagerConfig) -> Self {
        Self { config }
    }

    /// Run all three tiers against every `write.lock` found under `indexes_root`.
    pub fn sweep(&self, indexes_root: &Path) -> SweepReport {
        let mut report = SweepReport::default();
        if !indexes_root.exists() {
            return report;
        }

        let locks = Self::find_write_locks(indexes_root);
        let now = SystemTime::now();

        for lock_path in locks {
            let age = match lock_age(&lock_path, now) {
                Some(age) => age,
                None => continue, // lock vanished or mtime unreadable; nothing to report
            };

            if self.is_test_artifact(&lock_path) {
                if age >= Duration::from_secs(self.config.test_artifact_min_age_m * 60) {
                    match fs::remove_file(&lock_path) {
                        Ok(()) => {
                            report.test_artifacts_removed += 1;
                            debug!(path = %lock_path.display(), "removed test-artifact lock");
                        }
                        Err(e) => warn!(path = %lock_path.display(), error = %e, "failed to remove test-artifact lock"),
                    }
                }
                continue;
            }

            if age >= Duration::from_secs(self.config.workspace_min_age_m * 60) {
                match Self::safety_check(&lock_path) {
                    SafetyCheck::Safe => match fs::remove_file(&lock_path) {
                        Ok(()) => {
                            report.workspace_locks_removed += 1;
                            info!(path = %lock_path.display(), "removed stale workspace lock");
                        }
                        Err(e) => warn!(path = %lock_path.display(), error = %e, "failed to remove workspace lock"),
                    },
                    SafetyCheck::InUse => {
                        debug!(path = %lock_path.display(), "lock appears to be in active use, skipping");
                        if age >= Duration::from_secs(self.config.stuck_lock_age_m * 60) {
                            report.stuck_locks_found += 1;
                            report.diagnostics.push(self.diagnose(&lock_path, age));
                        }
                    }
                }
            }
        }

        report
    }

    /// Operator-invoked removal of a single lock: safety check first, then
    /// up to three retries with increasing back-off.
    pub fn force_remove(&self, lock_path: &Path) -> Result<(), String> {
        if let SafetyCheck::InUse = Self::safety_check(lock_path) {
            return Err("lock is in active use".to_string());
        }

        let mut last_err = String::new();
        for attempt in 0..3u32 {
            match fs::remove_file(lock_path) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    last_err = e.to_string();
                    std::thread::sleep(Duration::from_millis(100 * 2u64.pow(attempt)));
                }
            }
        }
        Err(last_err)
    }

    fn is_test_artifact(&self, lock_path: &Path) -> bool {
        let path_str = lock_path.to_string_lossy().to_lowercase().replace('\\', "/");
        TEST_ARTIFACT_SEGMENTS
            .iter()
            .any(|segment| path_str.contains(segment))
            || path_str
                .split('/')
                .any(|segment| segment.starts_with("test"))
    }

    /// (i) observe size, pause briefly, re-observe - unequal means active
    /// writer; (ii) attempt an exclusive open - failure means in use.
    fn safety_check(lock_path: &Path) -> SafetyCheck {
        let size_before = fs::metadata(lock_path).map(|m| m.len()).unwrap_or(0);
        std::thread::sleep(Duration::from_millis(50));
        let size_after = fs::metadata(lock_path).map(|m| m.len()).unwrap_or(0);
        if size_before != size_after {
            return SafetyCheck::InUse;
        }

        match fs::OpenOptions::new().write(true).open(lock_path) {
            Ok(file) => match file.try_lock_exclusive() {
                Ok(()) => {
                    let _ = FileExt::unlock(&file);
                    SafetyCheck::Safe
                }
                Err(_) => SafetyCheck::InUse,
            },
            Err(_) => SafetyCheck::InUse,
        }
    }

    fn diagnose(&self, lock_path: &Path, age: Duration) -> StuckLockDiagnostic {
        let size_bytes = fs::metadata(lock_path).map(|m| m.len()).unwrap_or(0);
        let workspace_label = lock_path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());
        let accessible = fs::OpenOptions::new().read(true).open(lock_path).is_ok();

        StuckLockDiagnostic {
            path: lock_path.to_path_buf(),
            workspace_label,
            age,
            size_bytes,
            accessible,
        }
    }

    fn find_write_locks(indexes_root: &Path) -> Vec<PathBuf> {
        WalkDir::new(indexes_root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() == WRITE_LOCK_FILENAME)
            .map(|entry| entry.into_path())
            .collect()
    }
}

enum SafetyCheck {
    Safe,
    InUse,
}

fn lock_age(path: &Path, now: SystemTime) -> Option<Duration> {
    let metadata = fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    now.duration_since(modified).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn touch_lock_with_age(dir: &Path, relative: &str, age: Duration) -> PathBuf {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(b"lock").unwrap();
        drop(f);
        let stale_time = SystemTime::now() - age;
        let stale_time = filetime::FileTime::from_system_time(stale_time);
        filetime::set_file_mtime(&path, stale_time).unwrap();
        path
    }

    #[test]
    fn tier1_removes_stale_test_artifact_locks() {
        let dir = tempfile::tempdir().unwrap();
        touch_lock_with_age(
            dir.path(),
            "abcd1234/bin/debug/write.lock",
            Duration::from_secs(120),
        );

        let manager = LockManager::new(LockManagerConfig::default());
        let report = manager.sweep(dir.path());

        assert_eq!(report.test_artifacts_removed, 1);
        assert_eq!(report.workspace_locks_removed, 0);
    }

    #[test]
    fn tier2_removes_old_unlocked_workspace_lock() {
        let dir = tempfile::tempdir().unwrap();
        touch_lock_with_age(dir.path(), "abcd1234/write.lock", Duration::from_secs(600));

        let manager = LockManager::new(LockManagerConfig::default());
        let report = manager.sweep(dir.path());

        assert_eq!(report.workspace_locks_removed, 1);
        assert_eq!(report.stuck_locks_found, 0);
    }

    #[test]
    fn tier2_never_removes_a_lock_held_by_an_active_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch_lock_with_age(dir.path(), "abcd1234/write.lock", Duration::from_secs(1800));

        let held_file = fs::OpenOptions::new().write(true).open(&path).unwrap();
        held_file.lock_exclusive().unwrap();

        let manager = LockManager::new(LockManagerConfig::default());
        let report = manager.sweep(dir.path());

        assert_eq!(report.workspace_locks_removed, 0);
        assert_eq!(report.stuck_locks_found, 1);
        assert!(path.exists());

        FileExt::unlock(&held_file).unwrap();
    }

    #[test]
    fn force_remove_refuses_a_lock_in_use() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch_lock_with_age(dir.path(), "abcd1234/write.lock", Duration::from_secs(60));
        let held_file = fs::OpenOptions::new().write(true).open(&path).unwrap();
        held_file.lock_exclusive().unwrap();

        let manager = LockManager::new(LockManagerConfig::default());
        assert!(manager.force_remove(&path).is_err());

        FileExt::unlock(&held_file).unwrap();
    }
}
