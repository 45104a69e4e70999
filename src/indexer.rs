//! Walks a workspace, applies include/exclude rules, builds `Document`s,
//! and submits them to a `BatchBuffer`.
//!
//! Grounded in `julie::watcher`'s ignore-pattern/extension-set building
//! (`build_ignore_patterns`, `build_supported_extensions`) and
//! `JulieWorkspace`'s directory-walk defaults, generalized from "index this
//! one workspace on startup" into a batch-submitting walk reusable by both
//! the initial index and single-file change updates.

use std::path::Path;
use std::time::Instant;

use walkdir::WalkDir;

use crate::batch_buffer::BatchBuffer;
use crate::config::CodesearchConfig;
use crate::document::{file_mtime_epoch_secs, now_epoch_secs, Document};
use crate::extractors::TypeExtractor;

const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct IndexRunReport {
    pub indexed_count: usize,
    pub skipped_count: usize,
    pub error_count: usize,
    pub duration_ms: u128,
    pub success: bool,
}

pub struct Indexer<'a> {
    config: &'a CodesearchConfig,
    extractor: TypeExtractor,
}

impl<'a> Indexer<'a> {
    pub fn new(config: &'a CodesearchConfig) -> Self {
        Self {
            config,
            extractor: TypeExtractor::new(),
        }
    }

    /// Walks `workspace` depth-first, skipping excluded directory names and
    /// inaccessible entries, submitting each eligible file to `buffer`.
    pub fn index_workspace(&self, workspace: &Path, buffer: &BatchBuffer) -> IndexRunReport {
        let started = Instant::now();
        let mut report = IndexRunReport { success: true, ..Default::default() };

        for entry in WalkDir::new(workspace)
            .into_iter()
            .filter_entry(|e| !self.is_excluded_dir(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => {
                    report.error_count += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            match self.build_document(workspace, entry.path()) {
                Ok(Some(doc)) => {
                    buffer.add(doc);
                    report.indexed_count += 1;
                }
                Ok(None) => report.skipped_count += 1,
                Err(_) => report.error_count += 1,
            }
        }

        if let Err(e) = buffer.flush_sync() {
            tracing::warn!(workspace = %workspace.display(), error = %e, "final flush failed for workspace walk");
            report.success = false;
        }
        report.duration_ms = started.elapsed().as_millis();
        report
    }

    /// Builds and submits a `Document` for a single path, used both by the
    /// initial walk and by `ChangePipeline` for single-file updates.
    pub fn index_file(&self, workspace: &Path, path: &Path, buffer: &BatchBuffer) -> std::io::Result<()> {
        if let Some(doc) = self.build_document(workspace, path)? {
            buffer.add(doc);
        }
        Ok(())
    }

    fn is_excluded_dir(&self, entry: &walkdir::DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        entry
            .file_name()
            .to_str()
            .map(|name| self.config.excluded_directories.iter().any(|excluded| excluded == name))
            .unwrap_or(false)
    }

    fn is_eligible(&self, path: &Path, size: u64) -> bool {
        if size > MAX_FILE_SIZE_BYTES {
            return false;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .supported_extensions
                    .iter()
                    .any(|supported| supported.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    fn build_document(&self, workspace: &Path, path: &Path) -> std::io::Result<Option<Document>> {
        let metadata = std::fs::metadata(path)?;
        if !self.is_eligible(path, metadata.len()) {
            return Ok(None);
        }

        let Ok(content) = std::fs::read_to_string(path) else {
            return Ok(None); // not valid UTF-8, treat as ineligible rather than an error
        };

        let path_str = path.to_string_lossy().into_owned();
        let relative_path = path
            .strip_prefix(workspace)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| path_str.clone());
        let filename = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let extension = path.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_default();
        let last_modified = file_mtime_epoch_secs(path).unwrap_or_else(|_| now_epoch_secs());
        let extraction = self.extractor.extract(&path_str, &content);

        Ok(Some(Document {
            path: path_str,
            path_components: relative_path
                .split(['/', '\\'])
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
            relative_path,
            filename,
            extension,
            size: metadata.len(),
            last_modified,
            content,
            extracted_types: extraction.types,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_resolver::PathResolver;
    use std::sync::Arc;

    #[test]
    fn walk_skips_excluded_directories_and_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules/skip.rs"), "fn skip() {}").unwrap();
        std::fs::write(dir.path().join("keep.rs"), "fn keep() {}").unwrap();

        let config = CodesearchConfig::default();
        let indexer = Indexer::new(&config);
        let resolver = PathResolver::new(dir.path().join("base"));
        let index_store = Arc::new(crate::index_store::IndexStore::new(resolver));
        let buffer = BatchBuffer::new(dir.path().to_path_buf(), index_store, Default::default());

        let report = indexer.index_workspace(dir.path(), &buffer);
        assert_eq!(report.indexed_count, 1);
    }

    #[test]
    fn build_document_relative_path_is_relative_to_the_workspace_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        std::fs::write(dir.path().join("src/nested/lib.rs"), "fn nested() {}").unwrap();

        let config = CodesearchConfig::default();
        let indexer = Indexer::new(&config);
        let doc = indexer
            .build_document(dir.path(), &dir.path().join("src/nested/lib.rs"))
            .unwrap()
            .unwrap();

        assert_eq!(doc.relative_path, "src/nested/lib.rs");
        assert_eq!(doc.path_components, vec!["src", "nested", "lib.rs"]);
    }
}
