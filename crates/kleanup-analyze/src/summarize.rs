//! Folding directory records into coarser summary groups.

use std::path::{Path, PathBuf};

use tracing::debug;

use kleanup_core::{GroupMap, RecordMap, SummaryGroup};

/// Default number of trailing path segments dropped to form a group key.
const DEFAULT_LEVELS: usize = 2;

/// Compute the group key for a record path: the path with its last two
/// segments removed.
///
/// Paths shallower than two segments have nothing left to key on. A
/// two-segment path such as `/tmp/sub` leaves only the filesystem root, which
/// is not a usable archive root either, so both fall into the unkeyed
/// (empty) group alongside `/tmp` itself.
pub fn group_key(path: &Path) -> PathBuf {
    key_at(path, DEFAULT_LEVELS)
}

fn key_at(path: &Path, levels: usize) -> PathBuf {
    match path.ancestors().nth(levels) {
        Some(ancestor) if ancestor.parent().is_some() => ancestor.to_path_buf(),
        _ => PathBuf::new(),
    }
}

/// Merges records that share an ancestor prefix.
#[derive(Debug, Clone)]
pub struct GroupSummarizer {
    levels: usize,
}

impl GroupSummarizer {
    /// Create a summarizer grouping by grandparent path.
    pub fn new() -> Self {
        Self {
            levels: DEFAULT_LEVELS,
        }
    }

    /// Group by the ancestor `levels` segments up instead.
    pub fn with_levels(levels: usize) -> Self {
        Self { levels }
    }

    /// Fold every record into its group.
    ///
    /// Measure-preserving: the counts and sizes summed over the result equal
    /// those summed over `records`.
    pub fn summarize(&self, records: &RecordMap) -> GroupMap {
        let mut groups = GroupMap::new();

        for record in records.values() {
            let key = key_at(&record.path, self.levels);
            groups
                .entry(key.clone())
                .or_insert_with(|| SummaryGroup::new(key))
                .absorb(record);
        }

        debug!(records = records.len(), groups = groups.len(), "summarized records");
        groups
    }
}

impl Default for GroupSummarizer {
    fn default() -> Self {
        Self::new()
    }
}
