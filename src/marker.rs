//! Boot marker: a well-known file that exists while a launch is in progress.
//!
//! Written at the start of every launch and removed once startup completes.
//! If the next launch finds it, fresh and stamped with the same build
//! identity, the previous launch never finished booting.
//!
//! No interprocess locking is done. Losing a race costs at most one spurious
//! or missed safe-mode entry.

use chrono::{DateTime, Duration, Utc};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SafeModeError};
use crate::identity::BuildIdentity;

/// File name of the boot marker. Must stay stable across releases.
pub const BOOT_MARKER_FILE_NAME: &str = "FREECAD_BOOT_NOT_COMPLETE";

/// Markers older than this are leftovers from long-ago runs.
pub const DEFAULT_STALE_AFTER_HOURS: i64 = 12;

/// What the marker says about the previous launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStatus {
    /// No marker on disk.
    Missing,
    /// Marker exists but is older than the freshness window.
    Stale,
    /// Marker is fresh but was written by a different build.
    Foreign,
    /// Marker metadata or body could not be read.
    Unreadable,
    /// Fresh marker from this build: the last boot did not complete.
    RecentFailure,
}

/// The boot marker for one temp directory.
#[derive(Debug, Clone)]
pub struct BootMarker {
    path: PathBuf,
    stale_after: Duration,
}

impl BootMarker {
    /// Marker in the current user's system temp directory.
    pub fn system() -> Self {
        Self::in_dir(&std::env::temp_dir())
    }

    /// Marker inside `dir`, using the standard file name.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(BOOT_MARKER_FILE_NAME),
            stale_after: Duration::hours(DEFAULT_STALE_AFTER_HOURS),
        }
    }

    /// Override the freshness window.
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Write the marker, truncating any previous content.
    ///
    /// The body is exactly the identity, with no trailing newline.
    pub fn create(&self, identity: &BuildIdentity) -> Result<()> {
        let mut file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        file.write_all(identity.as_bytes())
            .map_err(|e| self.io_error(e))?;
        // Flush is best-effort; the bytes are already handed to the OS.
        let _ = file.flush();
        Ok(())
    }

    /// Remove the marker. A missing marker is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Did the last boot of `identity` fail recently?
    pub fn recent_failure(&self, identity: &BuildIdentity) -> bool {
        self.recent_failure_at(identity, Utc::now())
    }

    /// Same as [`recent_failure`](Self::recent_failure) with an explicit clock.
    pub fn recent_failure_at(&self, identity: &BuildIdentity, now: DateTime<Utc>) -> bool {
        self.inspect_at(identity, now) == MarkerStatus::RecentFailure
    }

    pub fn inspect(&self, identity: &BuildIdentity) -> MarkerStatus {
        self.inspect_at(identity, Utc::now())
    }

    /// Classify the marker against `identity`, as of `now`.
    ///
    /// Checks run in order (existence, freshness, body) and stop at the
    /// first miss. Any I/O error means no failure was recorded.
    pub fn inspect_at(&self, identity: &BuildIdentity, now: DateTime<Utc>) -> MarkerStatus {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return MarkerStatus::Missing,
            Err(_) => return MarkerStatus::Unreadable,
        };

        let modified: DateTime<Utc> = match metadata.modified() {
            Ok(time) => time.into(),
            Err(_) => return MarkerStatus::Unreadable,
        };
        // A marker from the future counts as fresh.
        if now.signed_duration_since(modified) > self.stale_after {
            return MarkerStatus::Stale;
        }

        match fs::read(&self.path) {
            Ok(body) if body == identity.as_bytes() => MarkerStatus::RecentFailure,
            Ok(_) => MarkerStatus::Foreign,
            Err(_) => MarkerStatus::Unreadable,
        }
    }

    fn io_error(&self, source: io::Error) -> SafeModeError {
        SafeModeError::Marker {
            path: self.path.clone(),
            source,
        }
    }
}
