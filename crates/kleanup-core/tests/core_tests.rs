use kleanup_core::{
    parse_start_date, DirectoryRecord, ExclusionMatcher, KleanupError, ScanConfig, SummaryGroup,
    TimeWindow, TimestampKind, EXCLUDED_PREFIXES, PRIORITY_ROOTS,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

#[test]
fn test_default_config_covers_fixed_locations() {
    let config = ScanConfig::default();

    assert_eq!(config.priority_roots.len(), PRIORITY_ROOTS.len());
    assert!(config.priority_roots.contains(&PathBuf::from("/home")));
    assert!(config.priority_roots.contains(&PathBuf::from("/tmp")));
    assert!(config.additional_roots.contains(&PathBuf::from("/var")));
    assert_eq!(config.excluded_prefixes.len(), EXCLUDED_PREFIXES.len());
    assert_eq!(config.timestamp, TimestampKind::Created);
    assert_eq!(config.prior_window_days, 30);
}

#[test]
fn test_default_exclusions_prune_pseudo_filesystems() {
    let exclusions = ScanConfig::default().exclusions();

    assert!(exclusions.is_excluded(Path::new("/proc/1/status")));
    assert!(exclusions.is_excluded(Path::new("/proc")));
    assert!(exclusions.is_excluded(Path::new("/var/cache/apt")));
    assert!(!exclusions.is_excluded(Path::new("/var/lib/apt")));
    assert!(!exclusions.is_excluded(Path::new("/home/alice")));
}

#[test]
fn test_exclusion_is_plain_prefix_match() {
    let exclusions = ExclusionMatcher::new(["/data/skip"]);

    // No component boundary is implied.
    assert!(exclusions.is_excluded(Path::new("/data/skip")));
    assert!(exclusions.is_excluded(Path::new("/data/skipped/file")));
    assert!(!exclusions.is_excluded(Path::new("/data/keep")));
}

#[test]
fn test_window_bands_do_not_overlap() {
    let start = SystemTime::UNIX_EPOCH + Duration::from_secs(100 * 86_400);
    let since = TimeWindow::since(start);
    let prior = TimeWindow::prior_to(start, 30);

    for offset_days in [0u64, 1, 29, 30, 31, 60, 99] {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(offset_days * 86_400 + 3_600);
        assert!(
            !(since.matches(t) && prior.matches(t)),
            "day {offset_days} matched both bands"
        );
    }

    assert!(since.matches(start));
    assert!(!prior.matches(start));
    assert!(prior.matches(start - Duration::from_secs(1)));
    assert!(!prior.matches(start - Duration::from_secs(30 * 86_400 + 1)));
}

#[test]
fn test_parse_start_date() {
    let parsed = parse_start_date("06/15/24").unwrap();
    let earlier = parse_start_date("06/14/24").unwrap();
    let gap = parsed.duration_since(earlier).unwrap();

    // One calendar day, give or take a DST transition.
    assert!(gap >= Duration::from_secs(23 * 3_600));
    assert!(gap <= Duration::from_secs(25 * 3_600));

    for bad in ["", "2024-06-15", "13/01/24", "06/15", "yesterday"] {
        assert!(
            matches!(
                parse_start_date(bad),
                Err(KleanupError::InvalidDateFormat { .. })
            ),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn test_timestamp_kind_parsing() {
    assert_eq!("created".parse::<TimestampKind>().unwrap(), TimestampKind::Created);
    assert_eq!("MODIFIED".parse::<TimestampKind>().unwrap(), TimestampKind::Modified);
    assert!("accessed".parse::<TimestampKind>().is_err());
    assert_eq!(TimestampKind::Modified.to_string(), "modified");
}

#[test]
fn test_records_fold_into_group_measure() {
    let records = [
        DirectoryRecord::matched("/home/alice/docs", 3, 300, 0),
        DirectoryRecord::rollup("/home/alice", 300, 1),
        DirectoryRecord::matched("/home/bob/notes", 1, 20, 2),
    ];

    let mut group = SummaryGroup::new("/home");
    for record in &records {
        group.absorb(record);
    }

    assert_eq!(group.matched_file_count, 4);
    assert_eq!(group.total_size_bytes, 620);
    assert_eq!(group.members.len(), 3);
    assert!(records[1].is_rollup());
    assert!(!records[0].is_rollup());
}

#[test]
fn test_config_builder_overrides() {
    let config = ScanConfig::builder()
        .priority_roots(vec![PathBuf::from("/srv/data")])
        .additional_roots(Vec::<PathBuf>::new())
        .excluded_prefixes(vec!["/srv/data/tmp/".to_string()])
        .timestamp(TimestampKind::Modified)
        .prior_window_days(7u32)
        .build()
        .unwrap();

    assert_eq!(config.priority_roots, vec![PathBuf::from("/srv/data")]);
    assert!(config.additional_roots.is_empty());
    assert_eq!(config.prior_window_days, 7);
    assert!(config.exclusions().is_excluded(Path::new("/srv/data/tmp")));

    assert!(ScanConfig::builder()
        .priority_roots(Vec::<PathBuf>::new())
        .build()
        .is_err());
}
