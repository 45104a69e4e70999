//! Error kinds shared across the indexing, watching, and extraction core.
//!
//! Mirrors the leaf/seam split `julie::search::error` uses: a `thiserror`
//! enum for the precise failure, plus a `RecoveryHint` carried alongside so
//! callers (the JSON-RPC layer, out of scope here) can surface actionable
//! next steps instead of a bare message.

use std::path::PathBuf;
use thiserror::Error;

/// Steps a caller can take to recover from an error, plus tool names it
/// might invoke to do so. Attached to every error that crosses a workspace
/// or index boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryHint {
    pub steps: Vec<String>,
    pub suggested_tools: Vec<String>,
}

impl RecoveryHint {
    pub fn new(steps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            steps: steps.into_iter().map(Into::into).collect(),
            suggested_tools: Vec::new(),
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.suggested_tools.push(tool.into());
        self
    }
}

/// Core error type for the index lifecycle, file-watch pipeline, and type
/// extraction engine.
#[derive(Debug, Error)]
pub enum CodesearchError {
    #[error("workspace '{0}' is not indexed")]
    NotIndexed(String, RecoveryHint),

    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf, RecoveryHint),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf, RecoveryHint),

    #[error("failed to initialize index writer for '{0}'")]
    InitializationFailed(String, RecoveryHint),

    #[error("indexing failed for workspace '{0}'")]
    IndexingFailed(String, RecoveryHint),

    #[error("invalid pattern '{0}'")]
    InvalidPattern(String, RecoveryHint),

    #[error("validation error: {0}")]
    ValidationError(String, RecoveryHint),

    #[error("index corruption detected for workspace '{0}'")]
    Corruption(String, RecoveryHint),

    #[error("transient error reading '{0}': {1}")]
    Transient(PathBuf, String),

    #[error("tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodesearchError {
    /// Recovery hint attached to the error, where one applies.
    pub fn recovery_hint(&self) -> Option<&RecoveryHint> {
        match self {
            CodesearchError::NotIndexed(_, h)
            | CodesearchError::DirectoryNotFound(_, h)
            | CodesearchError::FileNotFound(_, h)
            | CodesearchError::InitializationFailed(_, h)
            | CodesearchError::IndexingFailed(_, h)
            | CodesearchError::InvalidPattern(_, h)
            | CodesearchError::ValidationError(_, h)
            | CodesearchError::Corruption(_, h) => Some(h),
            CodesearchError::Transient(..) | CodesearchError::Tantivy(_) | CodesearchError::Io(_) => {
                None
            }
        }
    }

    pub fn not_indexed(workspace: impl Into<String>) -> Self {
        let workspace = workspace.into();
        let hint = RecoveryHint::new([format!("run index_workspace for {workspace}")])
            .with_tool("index_workspace");
        CodesearchError::NotIndexed(workspace, hint)
    }

    pub fn initialization_failed(workspace: impl Into<String>, lock_path: &std::path::Path) -> Self {
        let hint = RecoveryHint::new([format!(
            "a stuck writer lock may be present at {}; run the lock manager sweep",
            lock_path.display()
        )])
        .with_tool("force_remove_lock");
        CodesearchError::InitializationFailed(workspace.into(), hint)
    }
}

pub type Result<T> = std::result::Result<T, CodesearchError>;

/// Errors from loading/parsing the on-disk configuration file. Kept separate
/// from `CodesearchError` since config loading is ambient plumbing, not a
/// core-component failure mode.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config file {0}: {1}")]
    Write(PathBuf, std::io::Error),
}
