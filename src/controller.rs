//! The safe-mode controller.
//!
//! Lifecycle, driven by the host from its main thread:
//! 1. [`SafeMode::initialize`] very early, before anything reads profile paths
//! 2. [`SafeMode::boot_up_complete`] once the risky startup work is done
//! 3. [`SafeMode::destruct`] (or drop) at shutdown
//!
//! State only moves `Inactive` → `Active`.

use tracing::{debug, warn};

use crate::config::{ConfigStore, SafeModeSettings};
use crate::identity::BuildIdentity;
use crate::marker::{BootMarker, MarkerStatus};
use crate::rebind;
use crate::scratch::{ScratchProvisioner, ScratchRoot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeModeState {
    /// Normal run: profile keys untouched.
    Inactive,
    /// Profile keys redirected to a scratch root.
    Active,
}

/// What [`SafeMode::initialize`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// No failed boot detected and none requested.
    Normal,
    /// Entered on request.
    Forced,
    /// Entered because the previous boot of this build did not complete.
    FailedBootDetected,
    /// Safe mode was wanted but no scratch root could be created.
    Unavailable,
    /// Already active from an earlier call; nothing re-provisioned.
    AlreadyActive,
}

/// Owns the boot marker protocol and, while active, the scratch profile.
#[derive(Debug)]
pub struct SafeMode {
    marker: BootMarker,
    provisioner: ScratchProvisioner,
    scratch: Option<ScratchRoot>,
}

impl Default for SafeMode {
    fn default() -> Self {
        Self::new()
    }
}

impl SafeMode {
    /// Controller using the system temp directory for marker and scratch roots.
    pub fn new() -> Self {
        Self::with_settings(&SafeModeSettings::default())
    }

    pub fn with_settings(settings: &SafeModeSettings) -> Self {
        Self {
            marker: BootMarker::in_dir(&settings.marker_dir())
                .with_stale_after(settings.stale_after()),
            provisioner: ScratchProvisioner::from_settings(settings),
            scratch: None,
        }
    }

    /// Check for a failed previous boot, arm the marker for this one, and
    /// enter safe mode if needed or requested.
    ///
    /// The marker must be inspected before it is rewritten, otherwise every
    /// launch would look like a failed one. Nothing here can fail startup:
    /// I/O problems are logged at debug level and skipped.
    pub fn initialize<C: ConfigStore + ?Sized>(
        &mut self,
        config: &mut C,
        force_safe_mode: bool,
    ) -> Activation {
        let identity = BuildIdentity::from_config(config);
        let status = self.marker.inspect(&identity);
        debug!(marker = %self.marker.path().display(), ?status, "Checked boot marker");
        let boot_failed = status == MarkerStatus::RecentFailure;

        if let Err(error) = self.marker.create(&identity) {
            debug!(%error, "Could not write boot marker");
        }

        if self.scratch.is_some() {
            return Activation::AlreadyActive;
        }
        if !boot_failed && !force_safe_mode {
            return Activation::Normal;
        }

        let root = match self.provisioner.provision() {
            Ok(root) => root,
            Err(error) => {
                debug!(%error, "Safe mode unavailable, continuing with normal profile");
                return Activation::Unavailable;
            }
        };

        // An unusable root is dropped here, which removes it from disk.
        let report = match rebind::rebind(config, root.path()) {
            Ok(report) => report,
            Err(error) => {
                debug!(%error, "Safe mode unavailable, continuing with normal profile");
                return Activation::Unavailable;
            }
        };
        if boot_failed {
            warn!("Failed boot detected, entering safe mode!");
        }
        for error in &report.failed {
            debug!(%error, "Profile directory not created");
        }
        debug!(root = %root.path().display(), "Safe mode active");
        self.scratch = Some(root);

        if boot_failed {
            Activation::FailedBootDetected
        } else {
            Activation::Forced
        }
    }

    /// Startup finished: remove the boot marker. Safe to call repeatedly.
    pub fn boot_up_complete(&self) {
        if let Err(error) = self.marker.clear() {
            debug!(%error, "Could not remove boot marker");
        }
    }

    pub fn enabled(&self) -> bool {
        self.scratch.is_some()
    }

    pub fn state(&self) -> SafeModeState {
        if self.enabled() {
            SafeModeState::Active
        } else {
            SafeModeState::Inactive
        }
    }

    /// Root of the scratch profile while active. Not written into the host
    /// configuration; only the per-key subdirectories are.
    pub fn scratch_root(&self) -> Option<&std::path::Path> {
        self.scratch.as_ref().map(ScratchRoot::path)
    }

    pub fn marker(&self) -> &BootMarker {
        &self.marker
    }

    /// Release the scratch profile, deleting it recursively. Idempotent.
    pub fn destruct(&mut self) {
        if let Some(root) = self.scratch.take() {
            let path = root.path().to_path_buf();
            if let Err(error) = root.close() {
                debug!(root = %path.display(), %error, "Could not remove scratch profile");
            }
        }
    }
}

impl Drop for SafeMode {
    fn drop(&mut self) {
        self.destruct();
    }
}
