//! External archiver invocation.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use kleanup_core::KleanupError;

use crate::options::ArchiveOptions;
use crate::plan::ArchivePlan;

/// Something that can pack a manifest of files into a password-protected archive.
pub trait Archiver {
    /// Archive every path listed in `manifest_file` into `archive`.
    fn archive(&self, archive: &Path, manifest_file: &Path, password: &str)
    -> Result<(), KleanupError>;
}

/// Runs 7-Zip with header encryption.
#[derive(Debug, Clone)]
pub struct SevenZipArchiver {
    program: String,
}

impl SevenZipArchiver {
    /// Create an archiver using the given executable.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Create an archiver from options.
    pub fn from_options(options: &ArchiveOptions) -> Self {
        Self::new(options.archiver_program.clone())
    }
}

impl Archiver for SevenZipArchiver {
    fn archive(
        &self,
        archive: &Path,
        manifest_file: &Path,
        password: &str,
    ) -> Result<(), KleanupError> {
        let mut list_arg = std::ffi::OsString::from("@");
        list_arg.push(manifest_file);

        info!(program = %self.program, archive = %archive.display(), "invoking archiver");
        let output = Command::new(&self.program)
            .arg("a")
            .arg(format!("-p{password}"))
            .arg("-mhe=on")
            .arg(archive)
            .arg(list_arg)
            .output()
            .map_err(|e| KleanupError::io(&self.program, e))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };

        Err(KleanupError::ArchiverFailure {
            status: output.status.code(),
            output: message,
        })
    }
}

/// Tracks the manifest file currently on disk so an interrupt can remove it.
///
/// Cloning shares the same slot.
#[derive(Debug, Clone, Default)]
pub struct ManifestGuard {
    current: Arc<Mutex<Option<PathBuf>>>,
}

impl ManifestGuard {
    /// Create an empty guard.
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, path: Option<PathBuf>) {
        if let Ok(mut slot) = self.current.lock() {
            *slot = path;
        }
    }

    /// The manifest currently registered, if any.
    pub fn current(&self) -> Option<PathBuf> {
        self.current.lock().ok().and_then(|slot| slot.clone())
    }

    /// Remove the registered manifest file, if any.
    pub fn cleanup(&self) {
        if let Some(path) = self.current.lock().ok().and_then(|mut slot| slot.take()) {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Write the plan's manifest to a temporary file and run the archiver on it.
///
/// The manifest file is removed afterwards whether or not the archiver
/// succeeded.
pub fn run_archive(
    archiver: &dyn Archiver,
    plan: &ArchivePlan,
    options: &ArchiveOptions,
    password: &str,
    guard: &ManifestGuard,
) -> Result<(), KleanupError> {
    let manifest_file = write_manifest(plan)?;
    guard.set(Some(manifest_file.path().to_path_buf()));

    let result = archiver.archive(&options.archive_name, manifest_file.path(), password);

    guard.set(None);
    let manifest_path = manifest_file.path().to_path_buf();
    if let Err(err) = manifest_file.close() {
        debug!(path = %manifest_path.display(), error = %err, "could not remove manifest");
    }

    result
}

fn write_manifest(plan: &ArchivePlan) -> Result<NamedTempFile, KleanupError> {
    let file = tempfile::Builder::new()
        .prefix("kleanup-manifest-")
        .suffix(".txt")
        .tempfile()
        .map_err(|e| KleanupError::io(std::env::temp_dir(), e))?;

    let mut writer = BufWriter::new(file.as_file());
    for path in plan.manifest.paths() {
        writeln!(writer, "{}", path.display()).map_err(|e| KleanupError::io(file.path(), e))?;
    }
    writer.flush().map_err(|e| KleanupError::io(file.path(), e))?;
    drop(writer);

    debug!(path = %file.path().display(), files = plan.manifest.len(), "wrote manifest");
    Ok(file)
}
