//! Two-tier directory aggregation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use tracing::{debug, info};

use kleanup_core::{
    DirectoryRecord, ExclusionMatcher, RecordMap, ScanConfig, SkipKind, SkippedEntry, TimeWindow,
    TimestampKind,
};

use crate::skipped::{note, SkipCounter};
use crate::walk::{note_walk_error, resolve_root, walker};

/// Walks roots and produces the sparse path-to-record mapping.
///
/// For every visited directory the direct files are tested against the
/// window first. A directory with no direct matches is still reported, with
/// a matched count of 0, when the files anywhere in its subtree (its own
/// included) add up to a nonzero size. That rolled-up size ignores the window.
#[derive(Debug, Clone)]
pub struct TreeAggregator {
    exclusions: ExclusionMatcher,
    timestamp: TimestampKind,
}

impl TreeAggregator {
    /// Create an aggregator from a scan configuration.
    pub fn new(config: &ScanConfig) -> Self {
        Self::with_parts(config.exclusions(), config.timestamp)
    }

    /// Create an aggregator from its parts.
    pub fn with_parts(exclusions: ExclusionMatcher, timestamp: TimestampKind) -> Self {
        Self {
            exclusions,
            timestamp,
        }
    }

    /// Aggregate every root, dropping access errors silently.
    pub fn aggregate(&self, roots: &[PathBuf], window: &TimeWindow) -> RecordMap {
        self.aggregate_with(roots, window, None)
    }

    /// Aggregate every root, recording access errors into `skipped`.
    pub fn aggregate_with(
        &self,
        roots: &[PathBuf],
        window: &TimeWindow,
        skipped: Option<&SkipCounter>,
    ) -> RecordMap {
        let mut records = RecordMap::new();

        for root in roots {
            let Some(root) = resolve_root(root, &self.exclusions, skipped) else {
                continue;
            };

            let start = Instant::now();
            let before = records.len();
            let listings = self.collect_listings(&root, skipped);
            fold_tree(&root, listings, window, &mut records);

            info!(
                root = %root.display(),
                records = records.len() - before,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "scanned root"
            );
        }

        records
    }

    /// Walk one root and group direct children by their parent directory.
    fn collect_listings(
        &self,
        root: &Path,
        skipped: Option<&SkipCounter>,
    ) -> HashMap<PathBuf, Listing> {
        let mut listings: HashMap<PathBuf, Listing> = HashMap::new();

        for entry_result in walker(root, &self.exclusions) {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    note_walk_error(&err, skipped);
                    continue;
                }
            };

            let file_type = entry.file_type();
            let path = entry.path();

            if file_type.is_symlink() {
                continue;
            }

            if file_type.is_dir() {
                listings.entry(path.clone()).or_default();
                if entry.depth() > 0 {
                    listings
                        .entry(entry.parent_path().to_path_buf())
                        .or_default()
                        .subdirs
                        .push(path);
                }
            } else if file_type.is_file() {
                // Excluded files were already removed by the walker.
                let metadata = match entry.metadata() {
                    Ok(m) => m,
                    Err(err) => {
                        let kind = err
                            .io_error()
                            .map(SkipKind::from_io)
                            .unwrap_or(SkipKind::MetadataError);
                        note(skipped, SkippedEntry::new(&path, kind));
                        continue;
                    }
                };

                listings
                    .entry(entry.parent_path().to_path_buf())
                    .or_default()
                    .files
                    .push(FileInfo {
                        size: metadata.len(),
                        timestamp: self.timestamp.read(&metadata),
                    });
            }
        }

        listings
    }
}

/// Direct contents of one directory.
#[derive(Debug, Default)]
struct Listing {
    files: Vec<FileInfo>,
    subdirs: Vec<PathBuf>,
}

#[derive(Debug)]
struct FileInfo {
    size: u64,
    timestamp: Option<SystemTime>,
}

/// Fold the tree under `root` into `records`, children before parents.
///
/// Directories are visited in reverse pre-order from an explicit stack, so
/// tree depth never grows the call stack. Each directory's subtree size,
/// regardless of the window, is held until its parent consumes it.
fn fold_tree(
    root: &Path,
    mut listings: HashMap<PathBuf, Listing>,
    window: &TimeWindow,
    records: &mut RecordMap,
) {
    let mut order: Vec<PathBuf> = Vec::with_capacity(listings.len());
    let mut stack = vec![root.to_path_buf()];
    while let Some(path) = stack.pop() {
        if let Some(listing) = listings.get(&path) {
            stack.extend(listing.subdirs.iter().cloned());
        }
        order.push(path);
    }

    let mut subtree_sizes: HashMap<PathBuf, u64> = HashMap::new();
    for path in order.into_iter().rev() {
        let listing = listings.remove(&path).unwrap_or_default();
        let below: u64 = listing
            .subdirs
            .iter()
            .map(|subdir| subtree_sizes.remove(subdir).unwrap_or(0))
            .sum();

        let (record, subtree) = fold_directory(&path, &listing, below, window);
        if let Some(record) = record {
            records.insert(path.clone(), record);
        }
        subtree_sizes.insert(path, subtree);
    }
}

/// The record for one directory, if any, and its own subtree size, given the
/// subtree size of its children.
fn fold_directory(
    path: &Path,
    listing: &Listing,
    below: u64,
    window: &TimeWindow,
) -> (Option<DirectoryRecord>, u64) {
    let mut count: u64 = 0;
    let mut matched_size: u64 = 0;
    let mut own_size: u64 = 0;
    for file in &listing.files {
        own_size += file.size;
        if window.matches_opt(file.timestamp) {
            count += 1;
            matched_size += file.size;
        }
    }

    let children = listing.subdirs.len() as u64;
    let subtree = own_size + below;
    let record = if count > 0 || matched_size > 0 {
        Some(DirectoryRecord::matched(path, count, matched_size, children))
    } else if subtree > 0 {
        // The rolled-up size ignores the window; the count stays zero.
        debug!(path = %path.display(), size = subtree, "rolled up subtree size");
        Some(DirectoryRecord::rollup(path, subtree, children))
    } else {
        None
    };

    (record, subtree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn write_file(path: &Path, size: usize, modified: SystemTime) {
        fs::write(path, vec![b'x'; size]).unwrap();
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
    }

    fn aggregator(excluded: &[String]) -> TreeAggregator {
        TreeAggregator::with_parts(
            ExclusionMatcher::new(excluded.iter().cloned()),
            TimestampKind::Modified,
        )
    }

    #[test]
    fn test_local_matches_and_rollup() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        let day0 = SystemTime::now() - 10 * DAY;

        write_file(&root.join("a"), 100, day0 + DAY);
        fs::create_dir(root.join("sub")).unwrap();
        fs::create_dir(root.join("sub/deeper")).unwrap();
        write_file(&root.join("sub/deeper/b"), 50, day0 - 5 * DAY);

        let records = aggregator(&[]).aggregate(&[root.clone()], &TimeWindow::since(day0));

        let top = &records[&root];
        assert_eq!(top.matched_file_count, 1);
        assert_eq!(top.total_size_bytes, 100);
        assert_eq!(top.child_directory_count, 1);

        // `sub` has no direct files but its subdirectory holds 50 bytes.
        let sub = &records[&root.join("sub")];
        assert!(sub.is_rollup());
        assert_eq!(sub.total_size_bytes, 50);

        // `deeper` has only an out-of-window file, which still rolls up.
        let deeper = &records[&root.join("sub/deeper")];
        assert_eq!(deeper.matched_file_count, 0);
        assert_eq!(deeper.total_size_bytes, 50);
        assert_eq!(deeper.child_directory_count, 0);
    }

    #[test]
    fn test_deep_chain_rolls_up_every_level() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        let now = SystemTime::now();

        let mut leaf = root.clone();
        for _ in 0..200 {
            leaf.push("d");
        }
        fs::create_dir_all(&leaf).unwrap();
        write_file(&leaf.join("f"), 7, now);

        let records = aggregator(&[]).aggregate(&[root.clone()], &TimeWindow::since(now - DAY));

        assert_eq!(records.len(), 201);
        assert_eq!(records[&leaf].matched_file_count, 1);
        assert!(records
            .values()
            .all(|record| record.total_size_bytes == 7));
        assert!(records[&root].is_rollup());
    }

    #[test]
    fn test_empty_directories_are_omitted() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("x/y/z")).unwrap();

        let records = aggregator(&[]).aggregate(&[root], &TimeWindow::since(SystemTime::UNIX_EPOCH));
        assert!(records.is_empty());
    }

    #[test]
    fn test_excluded_subtree_is_pruned() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        let now = SystemTime::now();

        fs::create_dir_all(root.join(".cache/foo")).unwrap();
        write_file(&root.join(".cache/foo/bar"), 10, now);
        write_file(&root.join("keep.txt"), 5, now);

        let excluded = format!("{}/.cache/", root.display());
        let records = aggregator(&[excluded]).aggregate(&[root.clone()], &TimeWindow::since(now - DAY));

        assert_eq!(records.len(), 1);
        assert_eq!(records[&root].total_size_bytes, 5);
        // The excluded directory is not counted as a child either.
        assert_eq!(records[&root].child_directory_count, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_counted_or_followed() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        let outside = TempDir::new().unwrap();
        let now = SystemTime::now();

        write_file(&outside.path().join("big"), 1000, now);
        write_file(&root.join("real"), 7, now);
        std::os::unix::fs::symlink(outside.path().join("big"), root.join("link")).unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("linkdir")).unwrap();

        let records = aggregator(&[]).aggregate(&[root.clone()], &TimeWindow::since(now - DAY));

        assert_eq!(records.len(), 1);
        assert_eq!(records[&root].matched_file_count, 1);
        assert_eq!(records[&root].total_size_bytes, 7);
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let counter = SkipCounter::new();
        let records = aggregator(&[]).aggregate_with(
            &[PathBuf::from("/definitely/not/here/kleanup")],
            &TimeWindow::since(SystemTime::UNIX_EPOCH),
            Some(&counter),
        );

        assert!(records.is_empty());
        assert_eq!(counter.count_of(SkipKind::Vanished), 1);
    }
}
