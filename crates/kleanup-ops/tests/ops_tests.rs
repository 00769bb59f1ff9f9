use kleanup_analyze::{GroupSummarizer, SelectionList};
use kleanup_core::{ExclusionMatcher, KleanupError, TimeWindow, TimestampKind};
use kleanup_ops::{
    append_report, run_archive, ArchiveOptions, BandScan, ManifestGuard, PlanBuilder,
    SelectedRoot, SevenZipArchiver, SpaceProbe,
};
use kleanup_scan::TreeAggregator;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

struct FixedSpace(u64);

impl SpaceProbe for FixedSpace {
    fn available_space(&self, _path: &Path) -> std::io::Result<u64> {
        Ok(self.0)
    }
}

/// `<root>/projects/app/src/main.rs` (40 B) and `<root>/projects/app/docs/README` (10 B).
fn scanned_tree() -> (TempDir, PathBuf, BandScan) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("projects/app/src")).unwrap();
    fs::create_dir_all(root.join("projects/app/docs")).unwrap();
    fs::write(root.join("projects/app/src/main.rs"), vec![b'x'; 40]).unwrap();
    fs::write(root.join("projects/app/docs/README"), vec![b'y'; 10]).unwrap();

    let window = TimeWindow::since(SystemTime::now() - Duration::from_secs(3_600));
    let records = TreeAggregator::with_parts(ExclusionMatcher::default(), TimestampKind::Modified)
        .aggregate(&[root.clone()], &window);
    let groups = GroupSummarizer::new().summarize(&records);

    let band = BandScan {
        title: "Recent files".to_string(),
        window,
        records,
        groups,
    };
    (temp, root, band)
}

/// The `projects` entry as the operator would pick it from the list.
fn pick_projects(band: &BandScan, root: &Path) -> Vec<SelectedRoot> {
    let list = SelectionList::present(&band.groups, 1);
    let entry = list
        .iter()
        .find(|entry| entry.group.key == root.join("projects"))
        .unwrap();
    SelectedRoot::from_entry(entry, band)
}

#[test]
fn test_plan_sizes_selected_group_and_lists_its_files() {
    let (_temp, root, band) = scanned_tree();
    let options = ArchiveOptions::default();
    let exclusions = ExclusionMatcher::default();

    // `src` and `docs` group under `projects`.
    let key = root.join("projects");
    let chosen = pick_projects(&band, &root);
    assert_eq!(chosen, vec![SelectedRoot::new(&key, 50)]);

    let plan = PlanBuilder::new(&options, &exclusions, &FixedSpace(1_000))
        .build(&chosen, None)
        .unwrap();

    assert_eq!(plan.roots, vec![key]);
    assert_eq!(plan.total_size, 50);
    assert_eq!(plan.manifest.len(), 2);
    assert_eq!(plan.manifest.total_size(), 50);
    assert!(!plan.needs_confirmation);
}

#[test]
fn test_plan_warns_when_archive_is_large_relative_to_free_space() {
    let (_temp, root, band) = scanned_tree();
    let options = ArchiveOptions::default();
    let exclusions = ExclusionMatcher::default();

    let plan = PlanBuilder::new(&options, &exclusions, &FixedSpace(100))
        .build(&pick_projects(&band, &root), None)
        .unwrap();
    assert!(plan.needs_confirmation);

    let err = PlanBuilder::new(&options, &exclusions, &FixedSpace(49))
        .build(&pick_projects(&band, &root), None)
        .unwrap_err();
    assert!(matches!(
        err,
        KleanupError::InsufficientSpace {
            required: 50,
            available: 49
        }
    ));
}

#[cfg(unix)]
#[test]
fn test_archiver_exit_status_is_reported_and_manifest_removed() {
    let (_temp, root, band) = scanned_tree();
    let out = TempDir::new().unwrap();
    let options = ArchiveOptions::builder()
        .archive_name(out.path().join("out.7z"))
        .build()
        .unwrap();
    let plan = PlanBuilder::new(&options, &ExclusionMatcher::default(), &FixedSpace(u64::MAX))
        .build(&pick_projects(&band, &root), None)
        .unwrap();
    let guard = ManifestGuard::new();

    run_archive(&SevenZipArchiver::new("true"), &plan, &options, "pw", &guard).unwrap();
    assert!(guard.current().is_none());

    let err = run_archive(&SevenZipArchiver::new("false"), &plan, &options, "pw", &guard)
        .unwrap_err();
    assert!(matches!(
        err,
        KleanupError::ArchiverFailure { status: Some(1), .. }
    ));
    assert!(guard.current().is_none());
}

#[test]
fn test_missing_archiver_is_an_io_error() {
    let (_temp, root, band) = scanned_tree();
    let options = ArchiveOptions::default();
    let plan = PlanBuilder::new(&options, &ExclusionMatcher::default(), &FixedSpace(u64::MAX))
        .build(&pick_projects(&band, &root), None)
        .unwrap();

    let err = run_archive(
        &SevenZipArchiver::new("kleanup-no-such-archiver"),
        &plan,
        &options,
        "pw",
        &ManifestGuard::new(),
    )
    .unwrap_err();
    assert!(matches!(err, KleanupError::Io { .. }));
}

#[test]
fn test_report_lists_band_records_and_manifest() {
    let (_temp, root, band) = scanned_tree();
    let options = ArchiveOptions::default();
    let plan = PlanBuilder::new(&options, &ExclusionMatcher::default(), &FixedSpace(u64::MAX))
        .build(&pick_projects(&band, &root), None)
        .unwrap();

    let out = TempDir::new().unwrap();
    let report = out.path().join("report.txt");
    append_report(&report, &[&band], &plan.manifest).unwrap();

    let text = fs::read_to_string(&report).unwrap();
    assert!(text.starts_with("Recent files\n"));
    assert!(text.contains(&format!("(1)\t{}\t40 B", root.join("projects/app/src").display())));
    assert!(text.contains(&format!("{},10 B,", root.join("projects/app/docs/README").display())));

    // One line per scanned directory, rollups included, not one per group.
    let directory_lines = text.lines().filter(|l| l.starts_with('(')).count();
    assert_eq!(directory_lines, band.records.len());
    assert!(band.records.len() > band.groups.len());
    assert!(text.contains(&format!("(0)\t{}\t50 B", root.join("projects/app").display())));
}
