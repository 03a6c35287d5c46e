//! Build identity stored in the boot marker.
//!
//! The identity is `<rev>[ <branch>][ <hash>]`, built from the host
//! configuration each time it is needed. A marker only counts as a failed
//! boot when its body matches the identity of the running build.

use std::fmt;

use crate::config::{ConfigStore, BUILD_REVISION, BUILD_REVISION_BRANCH, BUILD_REVISION_HASH};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildIdentity(String);

impl BuildIdentity {
    /// Derive the identity from the host configuration.
    ///
    /// A missing `BuildRevision` leaves an empty prefix rather than failing.
    pub fn from_config<C: ConfigStore + ?Sized>(config: &C) -> Self {
        let mut identity = config.get(BUILD_REVISION).unwrap_or_default().to_string();
        for key in [BUILD_REVISION_BRANCH, BUILD_REVISION_HASH] {
            if let Some(value) = config.get(key) {
                identity.push(' ');
                identity.push_str(value);
            }
        }
        Self(identity)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for BuildIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
