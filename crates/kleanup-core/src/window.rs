//! Time window filtering.

use std::fs::Metadata;
use std::time::{Duration, SystemTime};

use chrono::{Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::KleanupError;

/// Length of the comparison band that precedes the start date.
pub const PRIOR_WINDOW_DAYS: u32 = 30;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Which file timestamp a run compares against its window.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TimestampKind {
    /// Birth time where the filesystem records one, otherwise the inode change time.
    #[default]
    Created,
    /// Last modification time.
    Modified,
}

impl TimestampKind {
    /// Read this timestamp from file metadata.
    ///
    /// Returns `None` when the platform cannot supply it; callers treat that
    /// file as outside every window.
    pub fn read(self, metadata: &Metadata) -> Option<SystemTime> {
        match self {
            Self::Modified => metadata.modified().ok(),
            Self::Created => metadata.created().ok().or_else(|| changed_time(metadata)),
        }
    }
}

/// Inode change time (`st_ctime`).
#[cfg(unix)]
pub fn changed_time(metadata: &Metadata) -> Option<SystemTime> {
    use std::os::unix::fs::MetadataExt;

    let secs = u64::try_from(metadata.ctime()).ok()?;
    let nanos = u32::try_from(metadata.ctime_nsec()).unwrap_or(0);
    SystemTime::UNIX_EPOCH.checked_add(Duration::new(secs, nanos))
}

#[cfg(not(unix))]
pub fn changed_time(_metadata: &Metadata) -> Option<SystemTime> {
    None
}

/// A half-open time interval, open-ended when `end` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive lower bound.
    pub start: SystemTime,
    /// Exclusive upper bound, if any.
    pub end: Option<SystemTime>,
}

impl TimeWindow {
    /// Everything at or after `start`.
    pub fn since(start: SystemTime) -> Self {
        Self { start, end: None }
    }

    /// `start <= t < end`.
    pub fn between(start: SystemTime, end: SystemTime) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// The `days`-long band ending where `start` begins.
    pub fn prior_to(start: SystemTime, days: u32) -> Self {
        let span = Duration::from_secs(u64::from(days) * SECS_PER_DAY);
        let band_start = start.checked_sub(span).unwrap_or(SystemTime::UNIX_EPOCH);
        Self::between(band_start, start)
    }

    /// Check whether a timestamp lies in this window.
    pub fn matches(&self, timestamp: SystemTime) -> bool {
        match self.end {
            None => timestamp >= self.start,
            Some(end) => self.start <= timestamp && timestamp < end,
        }
    }

    /// Like [`matches`](Self::matches), but an unreadable timestamp never matches.
    pub fn matches_opt(&self, timestamp: Option<SystemTime>) -> bool {
        timestamp.is_some_and(|t| self.matches(t))
    }
}

/// Parse a `mm/dd/yy` start date into local midnight.
pub fn parse_start_date(input: &str) -> Result<SystemTime, KleanupError> {
    let invalid = || KleanupError::InvalidDateFormat {
        input: input.to_string(),
    };

    let date = NaiveDate::parse_from_str(input.trim(), "%m/%d/%y").map_err(|_| invalid())?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    let local = Local
        .from_local_datetime(&midnight)
        .earliest()
        .ok_or_else(invalid)?;

    Ok(SystemTime::from(local))
}
