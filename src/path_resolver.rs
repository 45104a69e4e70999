//! Maps a workspace path to a stable hash and a deterministic on-disk index
//! directory. Pure: never creates directories as a side effect of path
//! computation - directories are created by callers that are
//! about to write (see `IndexStore::open_or_reuse`).
//!
//! Grounded in `julie::workspace::registry::generate_workspace_id` (SHA-256
//! of a normalized path, first 8 hex chars) and `JulieWorkspace`'s
//! `indexes_root_path`/`workspace_index_path` accessors, generalized from a
//! single `.julie` directory per project to a single shared base directory
//! holding many workspaces by hash.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::CodesearchConfig;

/// Resolves workspace paths to their on-disk locations. Holds only the
/// expanded base directory - no mutable state, no I/O performed by its
/// accessors beyond string/path arithmetic.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base_dir: PathBuf,
}

impl PathResolver {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Build a resolver from configuration, expanding `~/` in `base_path`.
    pub fn from_config(config: &CodesearchConfig) -> Self {
        Self::new(config.expanded_base_path())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Canonical form of a workspace path: OS-appropriate full path,
    /// lower-cased, `\` normalized to `/`, trailing separators stripped.
    /// Falls back to the raw path string when canonicalization fails (the
    /// workspace may not exist yet, e.g. before first index) rather than
    /// erroring - path introspection must never crash callers.
    pub fn canonical_form(workspace: &Path) -> String {
        let resolved = workspace
            .canonicalize()
            .unwrap_or_else(|_| workspace.to_path_buf());

        resolved
            .to_string_lossy()
            .to_lowercase()
            .replace('\\', "/")
            .trim_end_matches('/')
            .to_string()
    }

    /// First 8 hex characters of SHA-256 of the canonical path.
    pub fn workspace_hash(workspace: &Path) -> String {
        let canonical = Self::canonical_form(workspace);
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let digest = hasher.finalize();
        format!("{:x}", digest)[..8].to_string()
    }

    /// `<base>/indexes/` - parent of every per-workspace index directory.
    pub fn indexes_root(&self) -> PathBuf {
        self.base_dir.join("indexes")
    }

    /// `<base>/indexes/<hash>` for the given workspace.
    pub fn index_dir(&self, workspace: &Path) -> PathBuf {
        self.indexes_root().join(Self::workspace_hash(workspace))
    }

    /// `<base>/indexes/<hash>` given an already-computed hash, for callers
    /// that only have the hash (e.g. iterating the metadata file).
    pub fn index_dir_for_hash(&self, hash: &str) -> PathBuf {
        self.indexes_root().join(hash)
    }

    /// `<base>/logs/`
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// `<base>/backups/backup_<name>/`
    pub fn backup_dir(&self, name: &str) -> PathBuf {
        self.base_dir.join("backups").join(format!("backup_{name}"))
    }

    /// `<base>/indexes/workspace.metadata.json`
    pub fn workspace_metadata_path(&self) -> PathBuf {
        self.indexes_root().join("workspace.metadata.json")
    }

    /// `<base>/config/codesearch.toml`
    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join("config").join("codesearch.toml")
    }

    /// Writer lock file for a workspace's index directory.
    pub fn write_lock_path(&self, workspace: &Path) -> PathBuf {
        self.index_dir(workspace).join("write.lock")
    }
}

/// One record in the workspace metadata file: `{hash -> {original_path,
/// created_at, last_used}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMetadataEntry {
    pub original_path: String,
    pub created_at: u64,
    pub last_used: u64,
}

/// Persists and loads the hash -> workspace mapping at
/// `<base>/indexes/workspace.metadata.json`. Reads are case-insensitive on
/// key lookup, matching its "JSON, case-insensitive on read".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceMetadataStore {
    entries: std::collections::HashMap<String, WorkspaceMetadataEntry>,
}

impl WorkspaceMetadataStore {
    pub fn load(path: &Path) -> std::io::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
    }

    /// Case-insensitive lookup by hash.
    pub fn get(&self, hash: &str) -> Option<&WorkspaceMetadataEntry> {
        let lower = hash.to_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| key.to_lowercase() == lower)
            .map(|(_, entry)| entry)
    }

    pub fn upsert(&mut self, hash: &str, original_path: &str, now: u64) {
        self.entries
            .entry(hash.to_string())
            .and_modify(|entry| entry.last_used = now)
            .or_insert_with(|| WorkspaceMetadataEntry {
                original_path: original_path.to_string(),
                created_at: now,
                last_used: now,
            });
    }

    pub fn remove(&mut self, hash: &str) -> Option<WorkspaceMetadataEntry> {
        self.entries.remove(hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_is_case_and_separator_normalized() {
        let a = PathResolver::canonical_form(Path::new("/tmp/does-not-exist/Foo"));
        let b = PathResolver::canonical_form(Path::new("/tmp/does-not-exist/foo/"));
        // Both fall back to raw path (doesn't exist), but lower-casing still applies.
        assert_eq!(a.to_lowercase(), a);
        assert!(!b.ends_with('/'));
    }

    #[test]
    fn workspace_hash_is_stable_and_8_hex_chars() {
        let p = Path::new("/tmp/some/workspace");
        let h1 = PathResolver::workspace_hash(p);
        let h2 = PathResolver::workspace_hash(p);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 8);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn index_dir_matches_base_indexes_hash_layout() {
        let resolver = PathResolver::new(PathBuf::from("/base"));
        let p = Path::new("/tmp/some/workspace");
        let expected = PathBuf::from("/base/indexes").join(PathResolver::workspace_hash(p));
        assert_eq!(resolver.index_dir(p), expected);
    }

    #[test]
    fn metadata_store_round_trips_and_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspace.metadata.json");

        let mut store = WorkspaceMetadataStore::default();
        store.upsert("abcd1234", "/tmp/workspace", 1_000);
        store.save(&path).unwrap();

        let loaded = WorkspaceMetadataStore::load(&path).unwrap();
        assert_eq!(loaded.get("ABCD1234").unwrap().original_path, "/tmp/workspace");
    }

    #[test]
    fn metadata_store_missing_file_yields_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let store = WorkspaceMetadataStore::load(&path).unwrap();
        assert!(store.is_empty());
    }
}
