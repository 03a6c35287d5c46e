//! Scratch profile roots.
//!
//! A scratch root is a fresh, uniquely-named temporary directory that stands
//! in for the user's profile while safe mode is active. It is removed
//! recursively on [`ScratchRoot::close`] or drop. A crash leaks it into the
//! temp area, where the OS reclaims it.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::SafeModeSettings;
use crate::error::{Result, SafeModeError};

/// Creates scratch roots under a parent directory.
#[derive(Debug, Clone)]
pub struct ScratchProvisioner {
    parent: Option<PathBuf>,
    prefix: String,
}

impl Default for ScratchProvisioner {
    fn default() -> Self {
        Self::from_settings(&SafeModeSettings::default())
    }
}

impl ScratchProvisioner {
    pub fn from_settings(settings: &SafeModeSettings) -> Self {
        Self {
            parent: settings.scratch_parent.clone(),
            prefix: settings.scratch_prefix.clone(),
        }
    }

    /// Directory new roots are created in.
    pub fn parent(&self) -> PathBuf {
        self.parent.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Create a fresh, empty scratch root.
    ///
    /// Uniqueness comes from the OS temp-directory facility, so no other
    /// process or earlier run can collide with it.
    pub fn provision(&self) -> Result<ScratchRoot> {
        let parent = self.parent();
        let dir = tempfile::Builder::new()
            .prefix(&self.prefix)
            .tempdir_in(&parent)
            .map_err(|source| SafeModeError::Provision { parent, source })?;
        Ok(ScratchRoot { dir })
    }
}

/// An owned scratch profile directory tree.
#[derive(Debug)]
pub struct ScratchRoot {
    dir: TempDir,
}

impl ScratchRoot {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the whole tree now, reporting any I/O failure.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}
