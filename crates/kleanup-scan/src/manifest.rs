//! Flat file listings for the archive step.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use kleanup_core::{changed_time, ExclusionMatcher, SkipKind, SkippedEntry};

use crate::skipped::{note, SkipCounter};
use crate::walk::{note_walk_error, resolve_root, walker};

/// One file that will be archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Absolute file path.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Creation time, or the change time where creation is unavailable.
    pub created: Option<SystemTime>,
    /// Last modification time.
    pub modified: Option<SystemTime>,
}

/// Every file beneath a set of archive roots.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// Entries in walk order, root by root.
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Iterate over the file paths.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.path.as_path())
    }

    /// Sum of all entry sizes.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the manifest lists no files.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Walk every root and list all non-excluded, non-symlink files.
///
/// No time window applies: once a directory is chosen, all of its current
/// files go into the archive.
pub fn collect_manifest<P: AsRef<Path>>(
    roots: &[P],
    exclusions: &ExclusionMatcher,
    skipped: Option<&SkipCounter>,
) -> Manifest {
    let mut manifest = Manifest::default();

    for root in roots {
        let Some(root) = resolve_root(root.as_ref(), exclusions, skipped) else {
            continue;
        };

        for entry_result in walker(&root, exclusions) {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    note_walk_error(&err, skipped);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            match entry.metadata() {
                Ok(metadata) => manifest.entries.push(ManifestEntry {
                    size: metadata.len(),
                    created: metadata.created().ok().or_else(|| changed_time(&metadata)),
                    modified: metadata.modified().ok(),
                    path,
                }),
                Err(err) => {
                    let kind = err
                        .io_error()
                        .map(SkipKind::from_io)
                        .unwrap_or(SkipKind::MetadataError);
                    note(skipped, SkippedEntry::new(path, kind));
                }
            }
        }
    }

    debug!(files = manifest.len(), bytes = manifest.total_size(), "collected manifest");
    manifest
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_lists_all_files_below_roots() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("top.txt"), "12345").unwrap();
        fs::write(root.join("a/b/deep.txt"), "123").unwrap();

        let manifest = collect_manifest(&[&root], &ExclusionMatcher::default(), None);

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.total_size(), 8);
        assert!(manifest.paths().all(Path::is_absolute));
        assert!(manifest.entries.iter().all(|e| e.modified.is_some()));
    }

    #[test]
    fn test_manifest_respects_exclusions() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("skip")).unwrap();
        fs::write(root.join("skip/x"), "x").unwrap();
        fs::write(root.join("keep"), "k").unwrap();

        let exclusions = ExclusionMatcher::new([format!("{}/skip/", root.display())]);
        let manifest = collect_manifest(&[&root], &exclusions, None);

        let paths: Vec<_> = manifest.paths().collect();
        assert_eq!(paths, vec![root.join("keep").as_path()]);
    }
}
