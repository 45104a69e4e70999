//! Accumulates documents per workspace; flushes when the pending count
//! reaches a size threshold or the oldest entry exceeds a max age.
//!
//! `IndexStore::index_documents` already does delete-by-term-then-add per
//! document (grounded in `julie::search::index::SearchIndex::add_symbol` /
//! `remove_by_file_path`'s `Term` + `delete_term` pattern); `BatchBuffer`
//! adds the size/age-triggered accumulation on top of that, which
//! `SearchIndex` doesn't do - it indexes eagerly, one call per document.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::BatchIndexingConfig;
use crate::document::Document;
use crate::index_store::IndexStore;

struct PendingEntry {
    doc: Document,
    enqueued_at: Instant,
}

struct BufferState {
    pending: Vec<PendingEntry>,
}

/// One buffer per workspace.
pub struct BatchBuffer {
    workspace: PathBuf,
    store: Arc<IndexStore>,
    config: BatchIndexingConfig,
    state: Mutex<BufferState>,
}

impl BatchBuffer {
    pub fn new(workspace: PathBuf, store: Arc<IndexStore>, config: BatchIndexingConfig) -> Self {
        Self {
            workspace,
            store,
            config,
            state: Mutex::new(BufferState { pending: Vec::new() }),
        }
    }

    /// Non-blocking add; the caller is responsible for periodically calling
    /// [`Self::flush_if_due`] for the age-based trigger - `add` itself only
    /// enforces the size threshold inline since that check is cheap and
    /// local to this call. A size-triggered flush failure is logged here
    /// rather than propagated, since `add`'s own contract is infallible;
    /// callers that need to observe flush failures call
    /// [`Self::flush_sync`] directly.
    pub fn add(&self, doc: Document) {
        let should_flush = {
            let mut state = self.state.lock().unwrap();
            state.pending.push(PendingEntry {
                doc,
                enqueued_at: Instant::now(),
            });
            state.pending.len() >= self.config.batch_size
        };
        if should_flush {
            if let Err(e) = self.flush_sync() {
                tracing::warn!(workspace = %self.workspace.display(), error = %e, "size-triggered flush failed, documents reinstated for retry");
            }
        }
    }

    /// A periodic timer should call this; flushes when the oldest pending
    /// entry exceeds the configured max batch age.
    pub fn flush_if_due(&self) -> crate::error::Result<()> {
        let max_age = Duration::from_secs(self.config.max_batch_age_s);
        let is_due = {
            let state = self.state.lock().unwrap();
            state
                .pending
                .first()
                .map(|entry| entry.enqueued_at.elapsed() >= max_age)
                .unwrap_or(false)
        };
        if is_due {
            self.flush_sync()
        } else {
            Ok(())
        }
    }

    /// Atomically drains the buffer under its mutex, performs delete-by-id
    /// (here: delete-by-path, since `Document::path` is the unique key) for
    /// every queued document, adds all documents, and commits. On error,
    /// drained documents are reinstated so the caller can retry, and the
    /// error is re-raised rather than swallowed.
    pub fn flush_sync(&self) -> crate::error::Result<()> {
        let drained = {
            let mut state = self.state.lock().unwrap();
            std::mem::take(&mut state.pending)
        };
        if drained.is_empty() {
            return Ok(());
        }

        let docs: Vec<Document> = drained.iter().map(|e| e.doc.clone()).collect();
        let result = self
            .store
            .index_documents(&self.workspace, &docs)
            .and_then(|_| self.store.commit(&self.workspace));

        if let Err(e) = result {
            let mut state = self.state.lock().unwrap();
            state.pending.extend(drained);
            return Err(e);
        }
        Ok(())
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }
}

/// Flushes every workspace's buffer. Callers hold one `BatchBuffer` per
/// workspace in a map external to this type; this helper is the shape of
/// the fan-out, kept free of the map's own locking.
pub fn commit_all<'a>(buffers: impl IntoIterator<Item = &'a BatchBuffer>) {
    for buffer in buffers {
        if let Err(e) = buffer.flush_sync() {
            tracing::warn!(workspace = %buffer.workspace.display(), error = %e, "commit_all: flush failed for workspace");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_resolver::PathResolver;

    fn sample_doc(path: &str) -> Document {
        Document {
            path: path.to_string(),
            relative_path: path.to_string(),
            filename: path.to_string(),
            extension: "rs".to_string(),
            size: 10,
            last_modified: crate::document::now_epoch_secs(),
            content: "fn alpha() {}".to_string(),
            path_components: vec![path.to_string()],
            extracted_types: Vec::new(),
        }
    }

    fn new_buffer(config: BatchIndexingConfig) -> (tempfile::TempDir, BatchBuffer) {
        let dir = tempfile::tempdir().unwrap();
        let resolver = PathResolver::new(dir.path().join("base"));
        let store = Arc::new(IndexStore::new(resolver));
        let workspace = dir.path().join("ws");
        std::fs::create_dir_all(&workspace).unwrap();
        let buffer = BatchBuffer::new(workspace, store, config);
        (dir, buffer)
    }

    #[test]
    fn add_below_threshold_does_not_flush() {
        let (_dir, buffer) = new_buffer(BatchIndexingConfig { batch_size: 10, max_batch_age_s: 30 });
        buffer.add(sample_doc("a.rs"));
        assert_eq!(buffer.pending_len(), 1);
    }

    #[test]
    fn reaching_max_size_triggers_flush() {
        let (_dir, buffer) = new_buffer(BatchIndexingConfig { batch_size: 2, max_batch_age_s: 30 });
        buffer.add(sample_doc("a.rs"));
        buffer.add(sample_doc("b.rs"));
        assert_eq!(buffer.pending_len(), 0);
    }

    #[test]
    fn flush_sync_is_a_no_op_on_an_empty_buffer() {
        let (_dir, buffer) = new_buffer(BatchIndexingConfig::default());
        buffer.flush_sync().unwrap();
        assert_eq!(buffer.pending_len(), 0);
    }
}
