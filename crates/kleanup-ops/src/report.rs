//! Audit report output and shared formatting helpers.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};

use kleanup_core::KleanupError;
use kleanup_scan::Manifest;

use crate::plan::BandScan;

/// Format size in human-readable form.
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Format a timestamp as local `YYYY-MM-DD HH:MM:SS`, or `-` when unknown.
pub fn format_timestamp(time: Option<SystemTime>) -> String {
    match time {
        Some(t) => DateTime::<Local>::from(t)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "-".to_string(),
    }
}

/// Append the audit report for a finished run to `path`.
///
/// Each band contributes a heading and one `(count)\tpath\tsize` line per
/// scanned directory, followed by one `path,size,created,modified` line per
/// archived file.
pub fn append_report(
    path: &Path,
    bands: &[&BandScan],
    manifest: &Manifest,
) -> Result<(), KleanupError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| KleanupError::io(path, e))?;

    write_report(BufWriter::new(file), bands, manifest).map_err(|e| KleanupError::io(path, e))
}

fn write_report<W: Write>(
    mut out: W,
    bands: &[&BandScan],
    manifest: &Manifest,
) -> std::io::Result<()> {
    for band in bands {
        writeln!(out, "{}", band.title)?;
        writeln!(out, "{}", "-".repeat(80))?;
        for record in band.records.values() {
            writeln!(
                out,
                "({})\t{}\t{}",
                record.matched_file_count,
                record.path.display(),
                format_size(record.total_size_bytes)
            )?;
        }
        writeln!(out)?;
    }

    for entry in &manifest.entries {
        writeln!(
            out,
            "{},{},{},{}",
            entry.path.display(),
            format_size(entry.size),
            format_timestamp(entry.created),
            format_timestamp(entry.modified)
        )?;
    }

    out.flush()
}
