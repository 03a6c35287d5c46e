//! Point the host's profile path keys at a scratch root.

use std::path::{Path, MAIN_SEPARATOR};

use crate::config::ConfigStore;
use crate::error::{Result, SafeModeError};

/// Profile keys redirected in safe mode, in the order they are rebound.
pub const PROFILE_KEYS: [&str; 6] = [
    "UserAppData",
    "UserConfigPath",
    "UserCachePath",
    "AppTempPath",
    "UserMacroPath",
    "UserHomePath",
];

/// Outcome of [`rebind`]. Every key is written either way; `failed` lists
/// the ones whose directory could not be created.
#[derive(Debug, Default)]
pub struct RebindReport {
    pub failed: Vec<SafeModeError>,
}

impl RebindReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Path stored for `key`: `<root><sep><key><sep>`, or `None` if `root` is
/// not valid UTF-8.
///
/// Consumers append file names directly, so the trailing separator is
/// required.
pub fn profile_path(root: &Path, key: &str) -> Option<String> {
    let mut path = root.join(key).into_os_string().into_string().ok()?;
    path.push(MAIN_SEPARATOR);
    Some(path)
}

/// Create one subdirectory per profile key under `root` and overwrite each
/// key in `config` with it.
///
/// A root that is not valid UTF-8 is rejected up front, with `config` and
/// the disk untouched. Past that point directory failures don't stop the
/// loop and nothing is rolled back; a key whose directory is missing
/// surfaces when the host tries to use it.
pub fn rebind<C: ConfigStore + ?Sized>(config: &mut C, root: &Path) -> Result<RebindReport> {
    let paths = PROFILE_KEYS
        .iter()
        .map(|key| profile_path(root, key).map(|path| (*key, path)))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| SafeModeError::NonUtf8Root {
            path: root.to_path_buf(),
        })?;

    let mut report = RebindReport::default();
    for (key, path) in paths {
        let dir = root.join(key);
        if let Err(source) = std::fs::create_dir_all(&dir) {
            report.failed.push(SafeModeError::ProfileDir { path: dir, source });
        }
        config.set(key, path);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_profile_path_ends_with_separator() {
        let path = profile_path(Path::new("/tmp/scratch"), "UserAppData").unwrap();
        assert!(path.ends_with(MAIN_SEPARATOR));
        assert!(Path::new(&path).starts_with("/tmp/scratch"));
        assert!(path.contains("UserAppData"));
    }

    #[test]
    fn test_rebind_creates_and_stores_all_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config: HashMap<String, String> = HashMap::new();
        config.insert("UserAppData".to_string(), "/home/me/.app/".to_string());
        config.insert("BuildRevision".to_string(), "1.0".to_string());

        let report = rebind(&mut config, tmp.path()).unwrap();
        assert!(report.is_complete());

        for key in PROFILE_KEYS {
            let value = &config[key];
            assert!(value.ends_with(MAIN_SEPARATOR), "{key} = {value}");
            assert!(Path::new(value).starts_with(tmp.path()));
            assert!(Path::new(value).is_dir());
        }
        assert_eq!(config["BuildRevision"], "1.0");
        assert_eq!(config.len(), PROFILE_KEYS.len() + 1);
    }

    #[test]
    fn test_rebind_tolerates_existing_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("UserCachePath")).unwrap();
        let mut config: HashMap<String, String> = HashMap::new();

        let report = rebind(&mut config, tmp.path()).unwrap();
        assert!(report.is_complete());
        assert_eq!(config.len(), PROFILE_KEYS.len());
    }

    #[test]
    fn test_rebind_writes_keys_even_when_dirs_fail() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let mut config: HashMap<String, String> = HashMap::new();

        let report = rebind(&mut config, &blocker).unwrap();
        assert_eq!(report.failed.len(), PROFILE_KEYS.len());
        for key in PROFILE_KEYS {
            assert_eq!(config[key], profile_path(&blocker, key).unwrap());
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_rebind_rejects_non_utf8_root() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join(OsStr::from_bytes(b"scratch-\xff"));
        std::fs::create_dir(&root).unwrap();
        let mut config: HashMap<String, String> = HashMap::new();
        config.insert("UserAppData".to_string(), "/home/me/.app/".to_string());

        assert!(profile_path(&root, "UserAppData").is_none());
        let err = rebind(&mut config, &root).unwrap_err();
        assert!(matches!(err, SafeModeError::NonUtf8Root { .. }));
        assert_eq!(err.path(), root);
        assert_eq!(config.len(), 1);
        assert_eq!(config["UserAppData"], "/home/me/.app/");
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }
}
