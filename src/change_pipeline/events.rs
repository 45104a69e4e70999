//! Translates `notify` events into the pipeline's own change vocabulary and
//! filters out paths the pipeline doesn't care about.
//!
//! Grounded in `julie::watcher::mod.rs`'s `FileChangeEvent`/`FileChangeType`
//! pair and its `should_index_file_static` eligibility check.

use std::path::{Path, PathBuf};

use crate::config::CodesearchConfig;
use crate::document::{now_epoch_millis, ChangeEvent, ChangeKind};

/// Admits an event only if its extension is supported and no path segment
/// matches the excluded set.
pub fn is_eligible(path: &Path, config: &CodesearchConfig) -> bool {
    let extension_ok = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            config
                .supported_extensions
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false);
    if !extension_ok {
        return false;
    }

    !path.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .map(|name| config.excluded_directories.iter().any(|excluded| excluded == name))
            .unwrap_or(false)
    })
}

/// Maps one `notify::Event` to zero or more `ChangeEvent`s, decomposing
/// renames into a delete of the old path and a create of the new one.
pub fn from_notify_event(event: &notify::Event, workspace: &Path, config: &CodesearchConfig) -> Vec<ChangeEvent> {
    use notify::EventKind;

    let now = now_epoch_millis();
    let make = |path: &PathBuf, kind: ChangeKind| -> Option<ChangeEvent> {
        if !is_eligible(path, config) {
            return None;
        }
        Some(ChangeEvent::new(path.clone(), workspace.to_path_buf(), kind, now))
    };

    match &event.kind {
        EventKind::Create(_) => event.paths.iter().filter_map(|p| make(p, ChangeKind::Created)).collect(),
        EventKind::Modify(notify::event::ModifyKind::Name(notify::event::RenameMode::Both)) if event.paths.len() == 2 => {
            let mut out = Vec::new();
            if let Some(e) = make(&event.paths[0], ChangeKind::Deleted) {
                out.push(e);
            }
            if let Some(e) = make(&event.paths[1], ChangeKind::Created) {
                out.push(e);
            }
            out
        }
        EventKind::Modify(_) => event.paths.iter().filter_map(|p| make(p, ChangeKind::Modified)).collect(),
        EventKind::Remove(_) => event.paths.iter().filter_map(|p| make(p, ChangeKind::Deleted)).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_directory_segment_is_rejected() {
        let config = CodesearchConfig::default();
        let path = Path::new("/repo/node_modules/pkg/index.js");
        assert!(!is_eligible(path, &config));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let config = CodesearchConfig::default();
        let path = Path::new("/repo/README.bin");
        assert!(!is_eligible(path, &config));
    }

    #[test]
    fn supported_extension_outside_excluded_dirs_is_admitted() {
        let config = CodesearchConfig::default();
        let path = Path::new("/repo/src/main.rs");
        assert!(is_eligible(path, &config));
    }
}
