//! Group summarization and selection resolution for kleanup.
//!
//! This crate turns a scan's [`RecordMap`] into something an operator can
//! choose from:
//!
//! - **Summarization** - fold records sharing a grandparent path into one
//!   [`SummaryGroup`] so wide trees collapse to a single line
//! - **Selection** - number the groups for display and resolve an operator's
//!   select/ignore answer into the chosen entries
//!
//! ```rust,ignore
//! use kleanup_analyze::{GroupSummarizer, SelectionCommand, SelectionList, SelectionMode, SelectionResolver};
//!
//! let groups = GroupSummarizer::new().summarize(&records);
//! let list = SelectionList::present(&groups, 1);
//!
//! let resolver = SelectionResolver::new([&list]);
//! let chosen = resolver.resolve(SelectionMode::Ignore, &SelectionCommand::parse("2, 3"));
//! ```

mod selection;
mod summarize;

pub use selection::{
    SelectionCommand, SelectionEntry, SelectionList, SelectionMode, SelectionResolver,
    LARGE_DIRECTORY_THRESHOLD,
};
pub use summarize::{group_key, GroupSummarizer};

// Re-export core types
pub use kleanup_core::{DirectoryRecord, GroupMap, RecordMap, SummaryGroup};
