//! Run configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::exclude::ExclusionMatcher;
use crate::window::{TimestampKind, PRIOR_WINDOW_DAYS};

/// Locations scanned first.
pub const PRIORITY_ROOTS: &[&str] = &["/home", "/root", "/tmp", "/etc"];

/// Broader locations scanned only when the operator asks for them.
pub const ADDITIONAL_ROOTS: &[&str] = &["/opt", "/srv", "/usr/local", "/var"];

/// Path prefixes never scanned or archived.
pub const EXCLUDED_PREFIXES: &[&str] = &[
    "/root/.cache/",
    "/home/.cache/",
    "/var/cache/",
    "/var/lib/docker/",
    "/var/log/journal/",
    "/proc/",
    "/sys/",
    "/dev/",
    "/run/",
];

/// Configuration for a scan run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Roots scanned in the first phase.
    #[builder(default = "to_paths(PRIORITY_ROOTS)")]
    pub priority_roots: Vec<PathBuf>,

    /// Roots scanned in the optional second phase.
    #[builder(default = "to_paths(ADDITIONAL_ROOTS)")]
    #[serde(default)]
    pub additional_roots: Vec<PathBuf>,

    /// Excluded path prefixes (plain string prefixes).
    #[builder(default = "to_strings(EXCLUDED_PREFIXES)")]
    #[serde(default)]
    pub excluded_prefixes: Vec<String>,

    /// Timestamp compared against the window.
    #[builder(default)]
    #[serde(default)]
    pub timestamp: TimestampKind,

    /// Length in days of the band preceding the start date.
    #[builder(default = "PRIOR_WINDOW_DAYS")]
    #[serde(default = "default_prior_window_days")]
    pub prior_window_days: u32,
}

fn default_prior_window_days() -> u32 {
    PRIOR_WINDOW_DAYS
}

fn to_paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref roots) = self.priority_roots {
            if roots.is_empty() {
                return Err("At least one priority root is required".to_string());
            }
            if roots.iter().any(|r| r.as_os_str().is_empty()) {
                return Err("Root path cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Build the exclusion matcher for this configuration.
    pub fn exclusions(&self) -> ExclusionMatcher {
        ExclusionMatcher::new(self.excluded_prefixes.iter().cloned())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            priority_roots: to_paths(PRIORITY_ROOTS),
            additional_roots: to_paths(ADDITIONAL_ROOTS),
            excluded_prefixes: to_strings(EXCLUDED_PREFIXES),
            timestamp: TimestampKind::default(),
            prior_window_days: PRIOR_WINDOW_DAYS,
        }
    }
}
