//! Archive step configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for building and writing an archive.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ArchiveOptions {
    /// Output archive file.
    #[builder(default = "PathBuf::from(\"archive.7z\")")]
    pub archive_name: PathBuf,

    /// Archiver executable.
    #[builder(default = "\"7z\".to_string()")]
    pub archiver_program: String,

    /// Share of free space above which the operator must confirm.
    #[builder(default = "0.25")]
    pub warn_ratio: f64,

    /// Path whose filesystem is checked for free space.
    #[builder(default = "PathBuf::from(\"/\")")]
    pub space_probe_path: PathBuf,
}

impl ArchiveOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ratio) = self.warn_ratio {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(format!("Warn ratio must be between 0 and 1, got {ratio}"));
            }
        }
        if let Some(ref name) = self.archive_name {
            if name.as_os_str().is_empty() {
                return Err("Archive name cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl ArchiveOptions {
    /// Create a new options builder.
    pub fn builder() -> ArchiveOptionsBuilder {
        ArchiveOptionsBuilder::default()
    }
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            archive_name: PathBuf::from("archive.7z"),
            archiver_program: "7z".to_string(),
            warn_ratio: 0.25,
            space_probe_path: PathBuf::from("/"),
        }
    }
}
