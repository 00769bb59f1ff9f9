//! Archive plan construction.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use kleanup_analyze::SelectionEntry;
use kleanup_core::{ExclusionMatcher, GroupMap, KleanupError, RecordMap, TimeWindow};
use kleanup_scan::{collect_manifest, Manifest, SkipCounter};

use crate::options::ArchiveOptions;
use crate::space::SpaceProbe;

/// The records and groups from one scan of one time band.
#[derive(Debug, Clone, Serialize)]
pub struct BandScan {
    /// Heading shown above this band's list and in the report.
    pub title: String,
    /// Window the band was scanned with.
    pub window: TimeWindow,
    /// Per-directory records.
    pub records: RecordMap,
    /// Records folded into summary groups.
    pub groups: GroupMap,
}

/// One archive root chosen by the operator, with the size its band gave it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedRoot {
    pub path: PathBuf,
    pub size: u64,
}

impl SelectedRoot {
    /// Create a selected root.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    /// The roots a chosen entry stands for, sized from the band it was
    /// listed in.
    ///
    /// A keyed group is one root carrying the group size. The unkeyed group
    /// is split into its member directories, each carrying its record size.
    pub fn from_entry(entry: &SelectionEntry, band: &BandScan) -> Vec<Self> {
        let group = &entry.group;
        if !group.is_unkeyed() {
            return vec![Self::new(&group.key, group.total_size_bytes)];
        }

        group
            .members
            .iter()
            .map(|member| {
                let size = band
                    .records
                    .get(member)
                    .map(|r| r.total_size_bytes)
                    .unwrap_or_default();
                Self::new(member, size)
            })
            .collect()
    }
}

/// Everything the archive step needs.
#[derive(Debug, Clone)]
pub struct ArchivePlan {
    /// Selected roots, deduplicated, with nested roots removed.
    pub roots: Vec<PathBuf>,
    /// Bytes the selected roots account for.
    pub total_size: u64,
    /// Free bytes at the time of planning.
    pub available: u64,
    /// Whether the total crosses the warning share of free space.
    pub needs_confirmation: bool,
    /// Every file to be archived.
    pub manifest: Manifest,
}

/// Deduplicate roots and drop any root nested under another selected root.
pub fn normalize_roots(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut sorted: Vec<&PathBuf> = paths.iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut roots: Vec<PathBuf> = Vec::with_capacity(sorted.len());
    for path in sorted {
        if !roots.iter().any(|kept| path.starts_with(kept)) {
            roots.push(path.clone());
        }
    }
    roots
}

/// Builds an [`ArchivePlan`] from the operator's chosen roots.
pub struct PlanBuilder<'a> {
    options: &'a ArchiveOptions,
    exclusions: &'a ExclusionMatcher,
    probe: &'a dyn SpaceProbe,
}

impl<'a> PlanBuilder<'a> {
    /// Create a plan builder.
    pub fn new(
        options: &'a ArchiveOptions,
        exclusions: &'a ExclusionMatcher,
        probe: &'a dyn SpaceProbe,
    ) -> Self {
        Self {
            options,
            exclusions,
            probe,
        }
    }

    /// Total the chosen roots, check free space and collect the manifest.
    ///
    /// Roots nested under another chosen root add nothing to the total. The
    /// same root chosen from two bands adds the size from each band.
    pub fn build(
        &self,
        selected: &[SelectedRoot],
        skipped: Option<&SkipCounter>,
    ) -> Result<ArchivePlan, KleanupError> {
        let paths: Vec<PathBuf> = selected.iter().map(|s| s.path.clone()).collect();
        let roots = normalize_roots(&paths);

        let mut total_size: u64 = 0;
        for choice in selected {
            if roots.contains(&choice.path) {
                total_size += choice.size;
            } else {
                debug!(path = %choice.path.display(), "nested root not counted");
            }
        }

        let probe_path = &self.options.space_probe_path;
        let available = self
            .probe
            .available_space(probe_path)
            .map_err(|e| KleanupError::io(probe_path, e))?;

        if available < total_size {
            return Err(KleanupError::InsufficientSpace {
                required: total_size,
                available,
            });
        }

        let needs_confirmation = total_size as f64 > available as f64 * self.options.warn_ratio;
        let manifest = collect_manifest(&roots, self.exclusions, skipped);

        info!(
            roots = roots.len(),
            total_size,
            available,
            files = manifest.len(),
            "built archive plan"
        );

        Ok(ArchivePlan {
            roots,
            total_size,
            available,
            needs_confirmation,
            manifest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kleanup_analyze::SelectionList;
    use kleanup_core::{DirectoryRecord, SummaryGroup};
    use std::path::Path;
    use std::time::SystemTime;

    struct FixedSpace(u64);

    impl SpaceProbe for FixedSpace {
        fn available_space(&self, _path: &Path) -> std::io::Result<u64> {
            Ok(self.0)
        }
    }

    fn build(selected: &[SelectedRoot], free: u64) -> Result<ArchivePlan, KleanupError> {
        PlanBuilder::new(
            &ArchiveOptions::default(),
            &ExclusionMatcher::default(),
            &FixedSpace(free),
        )
        .build(selected, None)
    }

    #[test]
    fn test_normalize_roots() {
        let paths = vec![
            PathBuf::from("/home/a/b"),
            PathBuf::from("/home"),
            PathBuf::from("/etc"),
            PathBuf::from("/home"),
            PathBuf::from("/homework"),
        ];
        assert_eq!(
            normalize_roots(&paths),
            vec![
                PathBuf::from("/etc"),
                PathBuf::from("/home"),
                PathBuf::from("/homework"),
            ]
        );
    }

    #[test]
    fn test_nested_roots_not_double_counted() {
        let plan = build(
            &[
                SelectedRoot::new("/nonexistent-kleanup/x", 100),
                SelectedRoot::new("/nonexistent-kleanup/x/y/z", 40),
            ],
            u64::MAX,
        )
        .unwrap();

        assert_eq!(plan.roots, vec![PathBuf::from("/nonexistent-kleanup/x")]);
        assert_eq!(plan.total_size, 100);
        assert!(!plan.needs_confirmation);
    }

    #[test]
    fn test_same_root_from_both_bands_adds_up() {
        let plan = build(
            &[
                SelectedRoot::new("/nonexistent-kleanup/p", 10),
                SelectedRoot::new("/nonexistent-kleanup/p", 1000),
            ],
            u64::MAX,
        )
        .unwrap();

        assert_eq!(plan.roots.len(), 1);
        assert_eq!(plan.total_size, 1010);
    }

    #[test]
    fn test_insufficient_space() {
        let err = build(&[SelectedRoot::new("/nonexistent-kleanup/x", 100)], 99).unwrap_err();

        assert!(matches!(
            err,
            KleanupError::InsufficientSpace {
                required: 100,
                available: 99
            }
        ));
    }

    #[test]
    fn test_quarter_of_free_space_needs_confirmation() {
        let plan = build(&[SelectedRoot::new("/nonexistent-kleanup/x", 100)], 399).unwrap();
        assert!(plan.needs_confirmation);
    }

    #[test]
    fn test_entry_sized_from_its_own_band() {
        let mut groups = GroupMap::new();
        let mut group = SummaryGroup::new("/data");
        group.absorb(&DirectoryRecord::matched("/data/a/b", 1, 1000, 0));
        groups.insert(PathBuf::from("/data"), group);

        let mut records = RecordMap::new();
        records.insert(
            PathBuf::from("/tmp"),
            DirectoryRecord::matched("/tmp", 2, 30, 0),
        );
        let mut unkeyed = SummaryGroup::new("");
        unkeyed.absorb(&records[Path::new("/tmp")]);
        groups.insert(PathBuf::new(), unkeyed);

        let band = BandScan {
            title: "prior".to_string(),
            window: TimeWindow::since(SystemTime::UNIX_EPOCH),
            records,
            groups,
        };
        let list = SelectionList::present(&band.groups, 3);

        let roots: Vec<SelectedRoot> = list
            .iter()
            .flat_map(|entry| SelectedRoot::from_entry(entry, &band))
            .collect();

        assert_eq!(
            roots,
            vec![
                SelectedRoot::new("/tmp", 30),
                SelectedRoot::new("/data", 1000),
            ]
        );
    }
}
