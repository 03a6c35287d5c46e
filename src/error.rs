//! Error taxonomy for the guard's filesystem work.
//!
//! None of these errors escape [`crate::SafeMode`]: the controller logs them
//! at `debug` level and carries on, since the guard must never be the reason
//! startup fails. Component functions still return them so callers that use
//! the pieces directly can see what went wrong.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure in one of the guard's filesystem steps.
#[derive(Debug, Error)]
pub enum SafeModeError {
    /// Reading, writing, or removing the boot marker failed.
    #[error("boot marker I/O failed at {path}: {source}")]
    Marker {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No scratch profile root could be created.
    #[error("failed to provision scratch profile under {parent}: {source}")]
    Provision {
        parent: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The scratch root path can't be stored in the host configuration.
    #[error("scratch root {path} is not valid UTF-8")]
    NonUtf8Root { path: PathBuf },

    /// A profile subdirectory inside the scratch root could not be created.
    #[error("failed to create profile directory {path}: {source}")]
    ProfileDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SafeModeError {
    /// Path the failing operation was working on.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Marker { path, .. } => path,
            Self::Provision { parent, .. } => parent,
            Self::NonUtf8Root { path } => path,
            Self::ProfileDir { path, .. } => path,
        }
    }
}

pub type Result<T> = std::result::Result<T, SafeModeError>;
