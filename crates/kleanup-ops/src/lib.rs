//! Archive planning and archiver invocation for kleanup.
//!
//! This crate turns the operator's final path set into an [`ArchivePlan`],
//! checks it against free disk space, and hands the manifest to the
//! external archiver. It also writes the optional audit report.

mod archiver;
mod options;
mod plan;
mod report;
mod space;

pub use archiver::{run_archive, Archiver, ManifestGuard, SevenZipArchiver};
pub use options::{ArchiveOptions, ArchiveOptionsBuilder};
pub use plan::{normalize_roots, ArchivePlan, BandScan, PlanBuilder, SelectedRoot};
pub use report::{append_report, format_size, format_timestamp};
pub use space::{DiskSpaceProbe, SpaceProbe};
