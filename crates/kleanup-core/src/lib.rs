//! Core types, filters and configuration for kleanup.
//!
//! This crate provides the leaf components shared by every other kleanup
//! crate: the time window filter, the exclusion matcher, the per-directory
//! records produced by a scan, and the run configuration.

mod config;
mod error;
mod exclude;
mod record;
mod window;

pub use config::{ScanConfig, ScanConfigBuilder, ADDITIONAL_ROOTS, EXCLUDED_PREFIXES, PRIORITY_ROOTS};
pub use error::{KleanupError, SkipKind, SkippedEntry};
pub use exclude::ExclusionMatcher;
pub use record::{DirectoryRecord, GroupMap, RecordMap, SummaryGroup};
pub use window::{changed_time, parse_start_date, TimeWindow, TimestampKind, PRIOR_WINDOW_DAYS};
