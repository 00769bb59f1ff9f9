//! Shared jwalk plumbing for the scan and manifest walks.

use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};
use tracing::debug;

use kleanup_core::{ExclusionMatcher, SkipKind, SkippedEntry};

use crate::skipped::{note, SkipCounter};

/// Build a serial walker that never follows links and prunes excluded
/// children before they are descended into.
pub(crate) fn walker(root: &Path, exclusions: &ExclusionMatcher) -> WalkDir {
    let exclusions = exclusions.clone();

    WalkDir::new(root)
        .parallelism(Parallelism::Serial)
        .follow_links(false)
        .skip_hidden(false)
        .sort(true)
        .process_read_dir(move |_depth, _path, _state, children| {
            children.retain(|child| match child {
                Ok(entry) => !exclusions.is_excluded(&entry.path()),
                Err(_) => true,
            });
        })
}

/// Normalize a root and decide whether it can be walked at all.
///
/// Excluded roots, symbolic links and non-directories are dropped.
pub(crate) fn resolve_root(
    root: &Path,
    exclusions: &ExclusionMatcher,
    skipped: Option<&SkipCounter>,
) -> Option<PathBuf> {
    let root = match std::path::absolute(root) {
        Ok(path) => path,
        Err(err) => {
            note(skipped, SkippedEntry::new(root, SkipKind::from_io(&err)));
            return None;
        }
    };

    if exclusions.is_excluded(&root) {
        debug!(root = %root.display(), "root is excluded");
        return None;
    }

    match std::fs::symlink_metadata(&root) {
        Ok(meta) if meta.is_dir() => Some(root),
        Ok(_) => {
            debug!(root = %root.display(), "root is not a directory");
            None
        }
        Err(err) => {
            note(skipped, SkippedEntry::new(&root, SkipKind::from_io(&err)));
            None
        }
    }
}

/// Record a walker error.
pub(crate) fn note_walk_error(err: &jwalk::Error, skipped: Option<&SkipCounter>) {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    let kind = match err.io_error().map(SkipKind::from_io) {
        Some(SkipKind::MetadataError) | None => SkipKind::ReadError,
        Some(kind) => kind,
    };
    debug!(path = %path.display(), error = %err, "skipping unreadable entry");
    note(skipped, SkippedEntry::new(path, kind));
}
