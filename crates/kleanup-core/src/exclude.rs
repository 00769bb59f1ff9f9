//! Excluded-prefix matching.

use std::path::{Path, MAIN_SEPARATOR};

use serde::{Deserialize, Serialize};

/// Decides whether a path lies under one of a fixed set of excluded prefixes.
///
/// Matching is a plain string-prefix test on the absolute path, not a glob.
/// A directory whose path equals a prefix minus its trailing separator
/// (`/root/.cache` for `/root/.cache/`) is excluded as well, so the walk can
/// prune it before descending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionMatcher {
    prefixes: Vec<String>,
}

impl ExclusionMatcher {
    /// Create a matcher from a list of prefixes.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// Check whether `path` is under an excluded prefix.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.prefixes.is_empty() {
            return false;
        }
        let text = path.to_string_lossy();
        self.prefixes.iter().any(|prefix| {
            text.starts_with(prefix.as_str())
                || prefix.strip_suffix(MAIN_SEPARATOR) == Some(text.as_ref())
        })
    }

    /// The configured prefixes.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}
