//! CLI smoke-test harness for the codesearch core - not the JSON-RPC
//! transport (out of scope here, see lib.rs). Exercises indexing, search,
//! live watching, and lock-manager maintenance against a real workspace
//! directory, the way `julie`'s MCP binary exercises its own core on
//! startup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use codesearch_core::change_pipeline::ChangePipeline;
use codesearch_core::{CodesearchConfig, IndexStore, Indexer, LockManager, PathResolver};

#[derive(Parser)]
#[command(name = "codesearch-cli", about = "Smoke-test harness for the codesearch core")]
struct Cli {
    /// Base directory for indexes/logs/config; defaults to the configured base path.
    #[arg(long)]
    base_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk a workspace, build documents, and commit them to its index.
    Index { workspace: PathBuf },
    /// Run a text query against an already-indexed workspace.
    Search {
        workspace: PathBuf,
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print live document count, size on disk, and per-extension breakdown.
    Stats { workspace: PathBuf },
    /// Print the workspace's index health state.
    Health { workspace: PathBuf },
    /// Watch a workspace for changes and apply them to its index until interrupted.
    Watch { workspace: PathBuf },
    /// Run the three-tier stale-lock sweep across every indexed workspace.
    LockSweep,
}

fn init_logging(resolver: &PathResolver) -> tracing_appender::non_blocking::WorkerGuard {
    let logs_dir = resolver.logs_dir();
    let _ = std::fs::create_dir_all(&logs_dir);
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "codesearch.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("codesearch_core=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking_file).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = CodesearchConfig::default();
    if let Some(base_path) = &cli.base_path {
        config.base_path = base_path.to_string_lossy().into_owned();
    }
    let resolver = PathResolver::from_config(&config);
    let _log_guard = init_logging(&resolver);

    match cli.command {
        Command::Index { workspace } => {
            let store = Arc::new(IndexStore::new(resolver.clone()));
            store.open_or_reuse(&workspace)?;
            let indexer = Indexer::new(&config);
            let buffer_config = config.batch_indexing.clone();
            let buffer = codesearch_core::batch_buffer::BatchBuffer::new(workspace.clone(), store.clone(), buffer_config);
            let report = indexer.index_workspace(&workspace, &buffer);
            info!(
                indexed = report.indexed_count,
                skipped = report.skipped_count,
                errors = report.error_count,
                duration_ms = report.duration_ms,
                "indexing complete"
            );
            println!(
                "indexed {} files ({} skipped, {} errors) in {}ms",
                report.indexed_count, report.skipped_count, report.error_count, report.duration_ms
            );
        }
        Command::Search { workspace, query, limit } => {
            let store = IndexStore::new(resolver.clone());
            store.open_or_reuse(&workspace)?;
            let hits = store.search(&workspace, &query, limit)?;
            for hit in hits {
                println!("{:.3}\t{}", hit.score, hit.relative_path);
            }
        }
        Command::Stats { workspace } => {
            let store = IndexStore::new(resolver.clone());
            store.open_or_reuse(&workspace)?;
            let stats = store.statistics(&workspace)?;
            println!("live documents:    {}", stats.live_docs);
            println!("deleted documents: {}", stats.deleted_docs);
            println!("size on disk:      {} bytes", stats.size_on_disk_bytes);
            println!("segments:          {}", stats.segment_count);
            for (ext, count) in stats.per_extension {
                println!("  .{ext}: {count}");
            }
        }
        Command::Health { workspace } => {
            let store = IndexStore::new(resolver.clone());
            println!("{:?}", store.health(&workspace));
        }
        Command::Watch { workspace } => {
            let store = Arc::new(IndexStore::new(resolver.clone()));
            store.open_or_reuse(&workspace)?;
            let config = Arc::new(config);
            let pipeline = ChangePipeline::start(workspace.clone(), config, store);
            info!(workspace = %workspace.display(), "watching for changes, press Ctrl+C to stop");
            tokio::signal::ctrl_c().await?;
            pipeline.stop().await;
        }
        Command::LockSweep => {
            let manager = LockManager::new(config.lock_manager.clone());
            let report = manager.sweep(&resolver.indexes_root());
            println!(
                "removed {} test-artifact locks, {} workspace locks; {} stuck locks found",
                report.test_artifacts_removed, report.workspace_locks_removed, report.stuck_locks_found
            );
            for diag in report.diagnostics {
                println!(
                    "  stuck: {} (workspace={}, age={:?}, size={}B, accessible={})",
                    diag.path.display(),
                    diag.workspace_label,
                    diag.age,
                    diag.size_bytes,
                    diag.accessible
                );
            }
        }
    }

    Ok(())
}
