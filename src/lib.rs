//! Per-workspace code search, file-watch, and type-extraction core.
//!
//! Three pieces do the hard engineering: [`index_store`] (index lifecycle,
//! LRU eviction, health checks), [`change_pipeline`] (watcher ->
//! debounce/coalesce/delete-verify), and [`extractors`] (grammar-driven
//! type/method harvesting with composite-file dispatch). Everything else -
//! [`path_resolver`], [`lock_manager`], [`analyzer`], [`indexer`],
//! [`batch_buffer`] - exists to keep those three correct and fast.
//!
//! The JSON-RPC transport, tool dispatch, and individual query-kind
//! answering (text/file/directory/recency/similarity) are external
//! collaborators, not part of this crate.

pub mod analyzer;
pub mod batch_buffer;
pub mod change_pipeline;
pub mod config;
pub mod document;
pub mod error;
pub mod extractors;
pub mod index_store;
pub mod indexer;
pub mod lock_manager;
pub mod path_resolver;

pub use config::CodesearchConfig;
pub use document::{ChangeEvent, ChangeKind, Document, PendingDelete};
pub use error::{CodesearchError, RecoveryHint, Result};
pub use extractors::{ExtractedMethod, ExtractedType, ExtractionResult, TypeExtractor};
pub use index_store::{IndexHealth, IndexStatistics, IndexStore, SearchHit};
pub use indexer::{IndexRunReport, Indexer};
pub use lock_manager::{LockManager, StuckLockDiagnostic, SweepReport};
pub use path_resolver::PathResolver;
