//! Host configuration mapping and guard settings.
//!
//! The host application keeps its configuration in a string→string mapping.
//! The guard only reads the build revision keys from it and, in safe mode,
//! overwrites the profile path keys. [`ConfigStore`] is the seam over that
//! mapping; it is implemented for the standard map types.
//!
//! [`SafeModeSettings`] holds the guard's own tunables, optionally loaded
//! from a JSON file.

use anyhow::Context;
use chrono::Duration;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::marker::DEFAULT_STALE_AFTER_HOURS;

/// Configuration key holding the build revision.
pub const BUILD_REVISION: &str = "BuildRevision";
/// Optional configuration key holding the branch name.
pub const BUILD_REVISION_BRANCH: &str = "BuildRevisionBranch";
/// Optional configuration key holding the commit hash.
pub const BUILD_REVISION_HASH: &str = "BuildRevisionHash";

/// String→string configuration mapping owned by the host application.
pub trait ConfigStore {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<&str>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: String);
}

impl<S: BuildHasher> ConfigStore for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(String::as_str)
    }

    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), value);
    }
}

impl ConfigStore for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        BTreeMap::get(self, key).map(String::as_str)
    }

    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), value);
    }
}

/// Tunables for the guard. Every field has a default, so an empty JSON
/// object (or no file at all) yields the standard behavior.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SafeModeSettings {
    /// Directory holding the boot marker. `None` means the system temp dir.
    pub marker_dir: Option<PathBuf>,
    /// Parent directory for scratch profile roots. `None` means the system temp dir.
    pub scratch_parent: Option<PathBuf>,
    /// Name prefix for scratch profile roots.
    pub scratch_prefix: String,
    /// Markers older than this many hours are ignored.
    pub stale_after_hours: i64,
}

fn default_scratch_prefix() -> String {
    "safe-mode-".to_string()
}

impl Default for SafeModeSettings {
    fn default() -> Self {
        Self {
            marker_dir: None,
            scratch_parent: None,
            scratch_prefix: default_scratch_prefix(),
            stale_after_hours: DEFAULT_STALE_AFTER_HOURS,
        }
    }
}

impl SafeModeSettings {
    /// Load settings from a JSON file.
    ///
    /// A missing or empty file yields the defaults. A file that exists but
    /// can't be read or parsed is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read safe mode settings: {}", path.display()))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse safe mode settings: {}", path.display()))
    }

    /// Directory the boot marker lives in.
    pub fn marker_dir(&self) -> PathBuf {
        self.marker_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Freshness window for the boot marker.
    ///
    /// A value that is not positive, or too large for a `Duration`, falls
    /// back to the default window.
    pub fn stale_after(&self) -> Duration {
        match Duration::try_hours(self.stale_after_hours) {
            Some(window) if self.stale_after_hours > 0 => window,
            _ => {
                debug!(
                    stale_after_hours = self.stale_after_hours,
                    "Invalid marker freshness window, using default"
                );
                Duration::hours(DEFAULT_STALE_AFTER_HOURS)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_store_get_and_set() {
        let mut config: HashMap<String, String> = HashMap::new();
        assert_eq!(ConfigStore::get(&config, BUILD_REVISION), None);

        config.set(BUILD_REVISION, "1.0".to_string());
        config.set(BUILD_REVISION, "1.1".to_string());
        assert_eq!(ConfigStore::get(&config, BUILD_REVISION), Some("1.1"));
    }

    #[test]
    fn test_btreemap_store_get_and_set() {
        let mut config: BTreeMap<String, String> = BTreeMap::new();
        config.set("UserAppData", "/home/me/.app/".to_string());
        assert_eq!(ConfigStore::get(&config, "UserAppData"), Some("/home/me/.app/"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = SafeModeSettings::load(&tmp.path().join("nope.json")).unwrap();
        assert_eq!(settings, SafeModeSettings::default());
        assert_eq!(settings.stale_after_hours, 12);
        assert_eq!(settings.scratch_prefix, "safe-mode-");
    }

    #[test]
    fn test_load_empty_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, "  \n").unwrap();

        let settings = SafeModeSettings::load(&path).unwrap();
        assert_eq!(settings, SafeModeSettings::default());
    }

    #[test]
    fn test_load_partial_file_keeps_other_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, r#"{"stale_after_hours": 2, "marker_dir": "/var/tmp/app"}"#).unwrap();

        let settings = SafeModeSettings::load(&path).unwrap();
        assert_eq!(settings.stale_after_hours, 2);
        assert_eq!(settings.marker_dir(), PathBuf::from("/var/tmp/app"));
        assert_eq!(settings.scratch_prefix, "safe-mode-");
        assert!(settings.scratch_parent.is_none());
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = SafeModeSettings::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse safe mode settings"));
    }

    #[test]
    fn test_stale_after_uses_configured_hours() {
        let settings = SafeModeSettings {
            stale_after_hours: 3,
            ..SafeModeSettings::default()
        };
        assert_eq!(settings.stale_after(), Duration::hours(3));
        assert_eq!(SafeModeSettings::default().stale_after(), Duration::hours(12));
    }

    #[test]
    fn test_stale_after_out_of_range_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, r#"{"stale_after_hours": 9223372036854775807}"#).unwrap();

        let settings = SafeModeSettings::load(&path).unwrap();
        assert_eq!(settings.stale_after_hours, i64::MAX);
        assert_eq!(settings.stale_after(), Duration::hours(12));
    }

    #[test]
    fn test_stale_after_not_positive_falls_back() {
        for hours in [-5, 0, i64::MIN] {
            let settings = SafeModeSettings {
                stale_after_hours: hours,
                ..SafeModeSettings::default()
            };
            assert_eq!(settings.stale_after(), Duration::hours(12), "hours = {hours}");
        }
    }

    #[test]
    fn test_marker_dir_defaults_to_system_temp() {
        let settings = SafeModeSettings::default();
        assert_eq!(settings.marker_dir(), std::env::temp_dir());
    }
}
