//! Per-workspace index lifecycle manager.
//!
//! Grounded in `julie::search::index::SearchIndex` (tantivy `Index` /
//! `IndexWriter` / `IndexReader`, `WRITER_HEAP_SIZE`, the commit-then-reload
//! pattern, `Term::from_field_text` + `delete_term` for remove-by-path), but
//! generalized from one process-wide index to a `workspace_hash ->
//! IndexHandle` map, with LRU eviction and health inspection `SearchIndex`
//! doesn't have.

mod schema;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime};

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{OwnedValue, TantivyDocument};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Term};

use crate::document::Document;
use crate::error::{CodesearchError, RecoveryHint};
use crate::path_resolver::PathResolver;

const WRITER_HEAP_SIZE: usize = 50_000_000;
const DEFAULT_MAX_OPEN_HANDLES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexHealth {
    Missing,
    Healthy,
    Degraded,
    Unhealthy,
    Locked,
}

#[derive(Debug, Clone, Default)]
pub struct IndexStatistics {
    pub live_docs: u64,
    pub deleted_docs: u64,
    pub size_on_disk_bytes: u64,
    pub segment_count: usize,
    pub per_extension: HashMap<String, u64>,
}

pub struct SearchHit {
    pub path: String,
    pub relative_path: String,
    pub score: f32,
    pub last_modified: u64,
}

struct IndexHandle {
    index: Index,
    writer: Mutex<Option<IndexWriter>>,
    reader: IndexReader,
    fields: schema::SchemaFields,
    last_use: Mutex<Instant>,
    commit_lock: Mutex<()>,
}

/// Owns every open per-workspace index.
pub struct IndexStore {
    resolver: PathResolver,
    handles: Mutex<HashMap<String, Arc<IndexHandle>>>,
    max_open_handles: usize,
}

impl IndexStore {
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            resolver,
            handles: Mutex::new(HashMap::new()),
            max_open_handles: DEFAULT_MAX_OPEN_HANDLES,
        }
    }

    pub fn with_max_open_handles(resolver: PathResolver, max_open_handles: usize) -> Self {
        Self {
            resolver,
            handles: Mutex::new(HashMap::new()),
            max_open_handles,
        }
    }

    /// Idempotent: opens the existing index, or creates an empty one on
    /// first call. Bumps the handle's last-use timestamp either way.
    pub fn open_or_reuse(&self, workspace: &Path) -> crate::error::Result<()> {
        let hash = PathResolver::workspace_hash(workspace);
        self.handle_for_hash(&hash).map(|_| ())
    }

    fn handle_for_hash(&self, hash: &str) -> crate::error::Result<Arc<IndexHandle>> {
        {
            let handles = self.handles.lock().unwrap();
            if let Some(handle) = handles.get(hash) {
                *handle.last_use.lock().unwrap() = Instant::now();
                return Ok(handle.clone());
            }
        }

        let dir = self.resolver.index_dir_for_hash(hash);
        std::fs::create_dir_all(&dir).map_err(|e| {
            CodesearchError::InitializationFailed(
                format!("could not create index directory {}: {e}", dir.display()),
                RecoveryHint::new(vec!["check permissions on the base directory".into()]),
            )
        })?;

        let handle = Arc::new(open_or_create_handle(&dir)?);

        let mut handles = self.handles.lock().unwrap();
        if handles.len() >= self.max_open_handles && !handles.contains_key(hash) {
            evict_least_recently_used(&mut handles);
        }
        handles.insert(hash.to_string(), handle.clone());
        Ok(handle)
    }

    /// For each doc: delete-by-term on `path`, then add. Not auto-committed -
    /// callers decide when to pay for a commit.
    pub fn index_documents(&self, workspace: &Path, docs: &[Document]) -> crate::error::Result<()> {
        let hash = PathResolver::workspace_hash(workspace);
        let handle = self.handle_for_hash(&hash)?;
        let mut guard = self.ensure_writer(&handle, workspace)?;
        let writer = guard.as_mut().expect("ensure_writer populates the slot");

        for doc in docs {
            let term = Term::from_field_text(handle.fields.path, &doc.path);
            writer.delete_term(term);
            writer.add_document(document_to_tantivy(&handle.fields, doc))?;
        }
        Ok(())
    }

    pub fn delete_document(&self, workspace: &Path, path: &str) -> crate::error::Result<()> {
        let hash = PathResolver::workspace_hash(workspace);
        let handle = self.handle_for_hash(&hash)?;
        let mut guard = self.ensure_writer(&handle, workspace)?;
        let writer = guard.as_mut().expect("ensure_writer populates the slot");
        writer.delete_term(Term::from_field_text(handle.fields.path, path));
        Ok(())
    }

    /// Opens the handle's writer lazily if it isn't already open, mapping a
    /// failure (typically a stuck `write.lock`) to `InitializationFailed`
    /// with the lock path attached, instead of panicking the process - the
    /// stuck-/live-writer-lock case of §8 scenario 4 must be surfaced as an
    /// error, not a crash.
    fn ensure_writer<'h>(
        &self,
        handle: &'h IndexHandle,
        workspace: &Path,
    ) -> crate::error::Result<std::sync::MutexGuard<'h, Option<IndexWriter>>> {
        let mut guard = handle.writer.lock().unwrap();
        if guard.is_none() {
            let writer = new_writer(&handle.index).map_err(|_| {
                CodesearchError::initialization_failed(
                    workspace.display().to_string(),
                    &self.resolver.write_lock_path(workspace),
                )
            })?;
            *guard = Some(writer);
        }
        Ok(guard)
    }

    /// Flush pending mutations and make them visible to new readers.
    /// Commit must not run concurrently with itself for the same
    /// workspace - serialized via the handle's `commit_lock`.
    pub fn commit(&self, workspace: &Path) -> crate::error::Result<()> {
        let hash = PathResolver::workspace_hash(workspace);
        let handle = self.handle_for_hash(&hash)?;
        let _commit_guard = handle.commit_lock.lock().unwrap();

        let mut guard = handle.writer.lock().unwrap();
        if let Some(writer) = guard.as_mut() {
            writer.commit()?;
        }
        drop(guard);
        handle.reader.reload()?;
        Ok(())
    }

    /// Obtains a reader snapshot consistent with the last commit; never
    /// observes an in-flight writer batch.
    pub fn search(&self, workspace: &Path, query: &str, limit: usize) -> crate::error::Result<Vec<SearchHit>> {
        let hash = PathResolver::workspace_hash(workspace);
        let handle = self.handle_for_hash(&hash)?;

        let searcher = handle.reader.searcher();
        let tokens = crate::analyzer::tokenize(query);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let query_text = tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ");

        let parser = QueryParser::for_index(
            &handle.index,
            vec![handle.fields.content, handle.fields.path_component],
        );
        let parsed = parser
            .parse_query(&query_text)
            .map_err(|e| CodesearchError::ValidationError(
                format!("invalid query: {e}"),
                RecoveryHint::new(vec!["simplify the search query".into()]),
            ))?;

        let top_docs = searcher.search(&parsed, &TopDocs::with_limit(limit))?;
        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let retrieved: TantivyDocument = searcher.doc(doc_address)?;
            let path = first_text(&retrieved, handle.fields.path);
            let relative_path = first_text(&retrieved, handle.fields.relative_path);
            let last_modified = first_u64(&retrieved, handle.fields.last_modified);
            hits.push(SearchHit {
                path,
                relative_path,
                score,
                last_modified,
            });
        }
        Ok(hits)
    }

    pub fn statistics(&self, workspace: &Path) -> crate::error::Result<IndexStatistics> {
        let hash = PathResolver::workspace_hash(workspace);
        let handle = self.handle_for_hash(&hash)?;
        let searcher = handle.reader.searcher();

        let live_docs = searcher.num_docs();
        let deleted_docs: u64 = searcher
            .segment_readers()
            .iter()
            .map(|r| r.num_deleted_docs() as u64)
            .sum();

        // Approximate per-extension distribution by scanning every live
        // document; fine at the document counts one workspace holds.
        let mut per_extension: HashMap<String, u64> = HashMap::new();
        let all_docs = searcher.search(
            &tantivy::query::AllQuery,
            &TopDocs::with_limit(live_docs.max(1) as usize),
        )?;
        for (_score, doc_address) in all_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            let ext = first_text(&doc, handle.fields.extension);
            *per_extension.entry(ext).or_insert(0) += 1;
        }

        let size_on_disk_bytes = dir_size(&self.resolver.index_dir_for_hash(&hash));

        Ok(IndexStatistics {
            live_docs,
            deleted_docs,
            size_on_disk_bytes,
            segment_count: searcher.segment_readers().len(),
            per_extension,
        })
    }

    /// Derived from directory presence, writer-lock presence/age, and a
    /// cheap validation pass.
    pub fn health(&self, workspace: &Path) -> IndexHealth {
        let hash = PathResolver::workspace_hash(workspace);
        let dir = self.resolver.index_dir_for_hash(&hash);
        if !dir.exists() {
            return IndexHealth::Missing;
        }

        let lock_path = dir.join("write.lock");
        if lock_path.exists() {
            if let Ok(file) = std::fs::OpenOptions::new().write(true).open(&lock_path) {
                use fs4::fs_std::FileExt;
                if file.try_lock_exclusive().is_err() {
                    return IndexHealth::Locked;
                }
                let _ = FileExt::unlock(&file);
            }
        }

        match Index::open_in_dir(&dir) {
            Ok(index) => match index.reader() {
                Ok(_reader) => IndexHealth::Healthy,
                Err(_) => IndexHealth::Degraded,
            },
            Err(_) => IndexHealth::Unhealthy,
        }
    }

    /// Removes every document, commits.
    pub fn clear(&self, workspace: &Path) -> crate::error::Result<()> {
        let hash = PathResolver::workspace_hash(workspace);
        let handle = self.handle_for_hash(&hash)?;
        {
            let mut guard = self.ensure_writer(&handle, workspace)?;
            let writer = guard.as_mut().expect("ensure_writer populates the slot");
            writer.delete_all_documents()?;
        }
        self.commit(workspace)
    }

    /// Evicts the LRU handle when the open-handle cap is reached; blocks
    /// briefly to flush.
    pub fn close_least_recently_used(&self) {
        let mut handles = self.handles.lock().unwrap();
        evict_least_recently_used(&mut handles);
    }

    /// Explicit corruption-recovery operation: backs up the index
    /// directory, validates recoverability, and rebuilds an empty index if
    /// the existing one can't be opened.
    pub fn repair(&self, workspace: &Path, backup_name: &str) -> crate::error::Result<IndexHealth> {
        let hash = PathResolver::workspace_hash(workspace);
        let dir = self.resolver.index_dir_for_hash(&hash);
        let backup_dir = self.resolver.backup_dir(backup_name);
        std::fs::create_dir_all(&backup_dir)?;
        copy_dir_recursive(&dir, &backup_dir)?;

        {
            let mut handles = self.handles.lock().unwrap();
            handles.remove(&hash);
        }

        // Segment validation: an index that opens and yields a working
        // reader is considered valid; anything else gets a fresh empty
        // index substituted in its place (bad-segment removal collapses to
        // a full rebuild rather than attempting partial segment surgery).
        let recoverable = Index::open_in_dir(&dir)
            .and_then(|index| index.reader())
            .is_ok();
        if !recoverable {
            std::fs::remove_dir_all(&dir)?;
            std::fs::create_dir_all(&dir)?;
            let (schema, _fields) = schema::build_schema();
            Index::create_in_dir(&dir, schema)?;
        }

        Ok(self.health(workspace))
    }
}

fn open_or_create_handle(dir: &Path) -> crate::error::Result<IndexHandle> {
    let (schema, fields) = schema::build_schema();
    let index = if dir.join("meta.json").exists() {
        Index::open_in_dir(dir)?
    } else {
        Index::create_in_dir(dir, schema)?
    };
    schema::register_code_analyzer(&index);

    let reader = index
        .reader_builder()
        .reload_policy(ReloadPolicy::Manual)
        .try_into()?;

    Ok(IndexHandle {
        index,
        writer: Mutex::new(None),
        reader,
        fields,
        last_use: Mutex::new(Instant::now()),
        commit_lock: Mutex::new(()),
    })
}

fn new_writer(index: &Index) -> tantivy::Result<IndexWriter> {
    index.writer(WRITER_HEAP_SIZE)
}

fn document_to_tantivy(fields: &schema::SchemaFields, doc: &Document) -> TantivyDocument {
    let mut tantivy_doc = TantivyDocument::new();
    tantivy_doc.add_text(fields.path, &doc.path);
    tantivy_doc.add_text(fields.relative_path, &doc.relative_path);
    tantivy_doc.add_text(fields.filename, &doc.filename);
    tantivy_doc.add_text(fields.extension, &doc.extension);
    tantivy_doc.add_u64(fields.size, doc.size);
    tantivy_doc.add_u64(fields.last_modified, doc.last_modified);
    tantivy_doc.add_text(fields.content, &doc.content);
    tantivy_doc.add_text(fields.path_component, doc.path_component_text());
    tantivy_doc
}

fn evict_least_recently_used(handles: &mut HashMap<String, Arc<IndexHandle>>) {
    let lru_key = handles
        .iter()
        .min_by_key(|(_, handle)| *handle.last_use.lock().unwrap())
        .map(|(key, _)| key.clone());

    if let Some(key) = lru_key {
        if let Some(handle) = handles.remove(&key) {
            if let Ok(mut guard) = handle.writer.lock() {
                if let Some(writer) = guard.as_mut() {
                    let _ = writer.commit();
                }
            }
        }
    }
}

fn first_text(doc: &TantivyDocument, field: tantivy::schema::Field) -> String {
    doc.get_first(field)
        .and_then(|v| match v {
            OwnedValue::Str(s) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

fn first_u64(doc: &TantivyDocument, field: tantivy::schema::Field) -> u64 {
    doc.get_first(field)
        .and_then(|v| match v {
            OwnedValue::U64(n) => Some(*n),
            _ => None,
        })
        .unwrap_or(0)
}

fn dir_size(dir: &Path) -> u64 {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    if !src.exists() {
        return Ok(());
    }
    for entry in walkdir::WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).unwrap();
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Recency boost formula. The store only guarantees `last_modified` holds
/// the file's mtime at indexing time - ranking by recency is out of scope
/// for the core index; this is kept as an illustrative hook, not wired
/// into any query path.
pub fn illustrative_recency_weight(last_modified: u64, extension: &str) -> f64 {
    let now = SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let age_days = now.saturating_sub(last_modified) as f64 / 86_400.0;
    let half_life_days = match extension {
        "md" | "toml" | "json" | "yaml" | "yml" => 21.0,
        _ => 7.0,
    };
    0.5_f64.powf(age_days / half_life_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::now_epoch_secs;

    fn sample_doc(path: &str, content: &str) -> Document {
        Document {
            path: path.to_string(),
            relative_path: path.trim_start_matches('/').to_string(),
            filename: Path::new(path).file_name().unwrap().to_string_lossy().into_owned(),
            extension: Path::new(path).extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_default(),
            size: content.len() as u64,
            last_modified: now_epoch_secs(),
            content: content.to_string(),
            path_components: path.split('/').filter(|s| !s.is_empty()).map(|s| s.to_string()).collect(),
            extracted_types: Vec::new(),
        }
    }

    #[test]
    fn index_then_search_finds_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PathResolver::new(dir.path().to_path_buf());
        let store = IndexStore::new(resolver);
        let workspace = dir.path().join("ws");
        std::fs::create_dir_all(&workspace).unwrap();

        store.open_or_reuse(&workspace).unwrap();
        let doc = sample_doc("/ws/lib.rs", "fn getUserData() {}");
        store.index_documents(&workspace, &[doc]).unwrap();
        store.commit(&workspace).unwrap();

        let hits = store.search(&workspace, "user", 10).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].path, "/ws/lib.rs");
    }

    #[test]
    fn reindexing_a_path_replaces_the_old_document() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PathResolver::new(dir.path().to_path_buf());
        let store = IndexStore::new(resolver);
        let workspace = dir.path().join("ws");
        std::fs::create_dir_all(&workspace).unwrap();

        store.index_documents(&workspace, &[sample_doc("/ws/a.rs", "alpha")]).unwrap();
        store.commit(&workspace).unwrap();
        store.index_documents(&workspace, &[sample_doc("/ws/a.rs", "bravo")]).unwrap();
        store.commit(&workspace).unwrap();

        let stats = store.statistics(&workspace).unwrap();
        assert_eq!(stats.live_docs, 1);
    }

    #[test]
    fn health_reports_missing_for_unindexed_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PathResolver::new(dir.path().to_path_buf());
        let store = IndexStore::new(resolver);
        let workspace = dir.path().join("never-indexed");
        assert_eq!(store.health(&workspace), IndexHealth::Missing);
    }
}
