//! Directory aggregation engine for kleanup.
//!
//! This crate walks the configured roots and builds the sparse
//! path-to-[`DirectoryRecord`] mapping that the rest of kleanup works from.
//!
//! # Overview
//!
//! - **Serial traversal** via jwalk, never following symbolic links
//! - **Early pruning** of excluded subtrees before descent
//! - **Two-tier aggregation**: directories with direct matches are reported
//!   as-is, directories without them are reported only when their subtree
//!   holds data at all (a *rollup* record, whose size ignores the window)
//! - **Non-fatal access errors**, optionally collected in a [`SkipCounter`]
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::SystemTime;
//!
//! use kleanup_scan::{ScanConfig, TimeWindow, TreeAggregator};
//!
//! let config = ScanConfig::default();
//! let aggregator = TreeAggregator::new(&config);
//! let records = aggregator.aggregate(&config.priority_roots, &TimeWindow::since(SystemTime::UNIX_EPOCH));
//!
//! for record in records.values() {
//!     println!("({}) {} {}", record.matched_file_count, record.path.display(), record.total_size_bytes);
//! }
//! ```

mod aggregator;
mod manifest;
mod skipped;
mod walk;

pub use aggregator::TreeAggregator;
pub use manifest::{collect_manifest, Manifest, ManifestEntry};
pub use skipped::SkipCounter;

// Re-export core types for convenience
pub use kleanup_core::{
    DirectoryRecord, ExclusionMatcher, RecordMap, ScanConfig, SkipKind, SkippedEntry, TimeWindow,
    TimestampKind,
};
