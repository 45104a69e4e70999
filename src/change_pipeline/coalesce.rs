//! Collapses a batch of raw change events into the minimal set of mutations
//! actually worth applying: per path, an atomic-write delete+create pair
//! within the configured window becomes one `Modified`, and any other
//! multi-event run for a path keeps only its last event.

use std::collections::HashMap;

use crate::document::{ChangeEvent, ChangeKind};

/// Groups `events` by path and coalesces each group, preserving source
/// order of first appearance across paths (cross-path ordering is not
/// promised, but deterministic output is still nicer to test against).
pub fn coalesce(events: Vec<ChangeEvent>, atomic_write_window_ms: u64) -> Vec<ChangeEvent> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ChangeEvent>> = HashMap::new();

    for event in events {
        let key = event.path.to_string_lossy().into_owned();
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(event);
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .map(|group| coalesce_one_path(group, atomic_write_window_ms))
        .collect()
}

fn coalesce_one_path(mut group: Vec<ChangeEvent>, atomic_write_window_ms: u64) -> ChangeEvent {
    group.sort_by_key(|e| e.timestamp);

    let delete = group.iter().find(|e| e.kind == ChangeKind::Deleted);
    let create = group.iter().find(|e| e.kind == ChangeKind::Created);

    if let (Some(delete), Some(create)) = (delete, create) {
        let delta = create.timestamp.abs_diff(delete.timestamp);
        if delta <= atomic_write_window_ms {
            return ChangeEvent::new(
                create.path.clone(),
                create.workspace.clone(),
                ChangeKind::Modified,
                create.timestamp,
            );
        }
    }

    group.into_iter().last().expect("group is never empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn event(kind: ChangeKind, timestamp: u64) -> ChangeEvent {
        ChangeEvent::new(PathBuf::from("/ws/file.rs"), PathBuf::from("/ws"), kind, timestamp)
    }

    #[test]
    fn delete_then_create_within_window_becomes_modified() {
        let events = vec![event(ChangeKind::Deleted, 100), event(ChangeKind::Created, 100)];
        let result = coalesce(events, 100);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, ChangeKind::Modified);
    }

    #[test]
    fn multiple_modifies_keep_only_the_last() {
        let events = vec![event(ChangeKind::Modified, 100), event(ChangeKind::Modified, 101), event(ChangeKind::Modified, 102)];
        let result = coalesce(events, 100);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].timestamp, 102);
    }

    #[test]
    fn distinct_paths_each_produce_their_own_event() {
        let mut events = vec![event(ChangeKind::Created, 100)];
        events.push(ChangeEvent::new(PathBuf::from("/ws/other.rs"), PathBuf::from("/ws"), ChangeKind::Created, 100));
        let result = coalesce(events, 100);
        assert_eq!(result.len(), 2);
    }
}
