//! Collection of entries the walks could not account for.

use std::cell::RefCell;

use kleanup_core::{SkipKind, SkippedEntry};

/// Collects skipped entries without interrupting a walk.
///
/// Walks take an `Option<&SkipCounter>`; passing `None` keeps the default
/// behavior of dropping access errors silently.
#[derive(Debug, Default)]
pub struct SkipCounter {
    entries: RefCell<Vec<SkippedEntry>>,
}

impl SkipCounter {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped entry.
    pub fn record(&self, entry: SkippedEntry) {
        self.entries.borrow_mut().push(entry);
    }

    /// Number of entries skipped so far.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if nothing was skipped.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Number of entries skipped for a given reason.
    pub fn count_of(&self, kind: SkipKind) -> usize {
        self.entries.borrow().iter().filter(|e| e.kind == kind).count()
    }

    /// Take the collected entries, leaving the collector empty.
    pub fn take(&self) -> Vec<SkippedEntry> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }
}

/// Record into an optional collector.
pub(crate) fn note(skipped: Option<&SkipCounter>, entry: SkippedEntry) {
    if let Some(counter) = skipped {
        counter.record(entry);
    }
}
