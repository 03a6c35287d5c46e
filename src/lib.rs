//! `safe_mode_guard` — Boot-failure detection and safe-mode profile redirection.
//!
//! Provides:
//! - `marker` — The boot marker written at launch and cleared on successful startup
//! - `identity` — Build identity stamped into the marker
//! - `scratch` — Fresh temporary profile roots with recursive cleanup
//! - `rebind` — Redirect the host's profile path keys to a scratch root
//! - `controller` — The `SafeMode` state machine tying the pieces together
//! - `config` — Host configuration mapping and guard settings
//!
//! ```no_run
//! use std::collections::HashMap;
//! use safe_mode_guard::SafeMode;
//!
//! let mut config: HashMap<String, String> = HashMap::new();
//! config.insert("BuildRevision".into(), "1.0".into());
//!
//! let mut safe_mode = SafeMode::new();
//! safe_mode.initialize(&mut config, false);
//! // ... load plugins, show the main window ...
//! safe_mode.boot_up_complete();
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod marker;
pub mod rebind;
pub mod scratch;

pub use config::{ConfigStore, SafeModeSettings};
pub use controller::{Activation, SafeMode, SafeModeState};
pub use error::SafeModeError;
pub use identity::BuildIdentity;
pub use marker::{BootMarker, MarkerStatus, BOOT_MARKER_FILE_NAME};
pub use rebind::PROFILE_KEYS;
pub use scratch::{ScratchProvisioner, ScratchRoot};
