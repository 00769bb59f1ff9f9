//! Per-directory aggregates and their summary groups.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Sparse result of a scan, keyed and ordered by directory path.
pub type RecordMap = BTreeMap<PathBuf, DirectoryRecord>;

/// Summary groups keyed and ordered by group key.
pub type GroupMap = BTreeMap<PathBuf, SummaryGroup>;

/// Aggregate statistics for one scanned directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Absolute directory path.
    pub path: PathBuf,
    /// Direct files that fell in the window (0 for a rollup record).
    pub matched_file_count: u64,
    /// Size of the matched files, or the subtree total for a rollup record.
    pub total_size_bytes: u64,
    /// Immediate subdirectories.
    pub child_directory_count: u64,
}

impl DirectoryRecord {
    /// Create a record for a directory with direct matches.
    pub fn matched(path: impl Into<PathBuf>, count: u64, size: u64, children: u64) -> Self {
        Self {
            path: path.into(),
            matched_file_count: count,
            total_size_bytes: size,
            child_directory_count: children,
        }
    }

    /// Create a pass-through record whose size comes from its descendants.
    ///
    /// The count stays 0 even though the size is nonzero.
    pub fn rollup(path: impl Into<PathBuf>, subtree_size: u64, children: u64) -> Self {
        Self::matched(path, 0, subtree_size, children)
    }

    /// Whether this record only carries a descendant rollup.
    pub fn is_rollup(&self) -> bool {
        self.matched_file_count == 0
    }
}

/// Records folded together under a shared grandparent path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryGroup {
    /// Group key; empty for records shallower than two path segments.
    pub key: PathBuf,
    /// Sum of member matched counts.
    pub matched_file_count: u64,
    /// Sum of member sizes.
    pub total_size_bytes: u64,
    /// Sum of member child directory counts.
    pub child_directory_count: u64,
    /// Paths of the records folded into this group, in order of arrival.
    pub members: Vec<PathBuf>,
}

impl SummaryGroup {
    /// Create an empty group.
    pub fn new(key: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Fold a record into this group.
    pub fn absorb(&mut self, record: &DirectoryRecord) {
        self.matched_file_count += record.matched_file_count;
        self.total_size_bytes += record.total_size_bytes;
        self.child_directory_count += record.child_directory_count;
        self.members.push(record.path.clone());
    }

    /// Whether this is the catch-all group for shallow paths.
    pub fn is_unkeyed(&self) -> bool {
        self.key.as_os_str().is_empty()
    }

    /// Paths to hand to the archiver when this group is chosen.
    ///
    /// The unkeyed group has no usable directory of its own, so its members
    /// stand in for it.
    pub fn archive_roots(&self) -> Vec<&Path> {
        if self.is_unkeyed() {
            self.members.iter().map(PathBuf::as_path).collect()
        } else {
            vec![self.key.as_path()]
        }
    }

    /// Label shown to the operator.
    pub fn display_path(&self) -> String {
        if self.is_unkeyed() {
            "(top level)".to_string()
        } else {
            self.key.display().to_string()
        }
    }
}
