// SPDX-License-Identifier: GPL-3.0-only

//! Administrator override file
//!
//! `mount_options.conf` is read fresh for every request. A missing or empty
//! file means "no overrides"; anything else that goes wrong is logged and
//! also treated as "no overrides".

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use super::keyfile::parse_key_file;
use crate::config::ConfigLocator;
use crate::error::{MountOptionsError, Result};
use crate::model::ConfigurationStore;

pub const GLOBAL_CONFIG_FILE_NAME: &str = "mount_options.conf";

/// Parse the file at `path`.
///
/// `Ok(None)` when the file does not exist or has no sections.
pub fn load_config_file(path: &Path) -> Result<Option<ConfigurationStore>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No mount options config file at {:?}", path);
            return Ok(None);
        }
        Err(e) => return Err(MountOptionsError::Io(e)),
    };

    match parse_key_file(&text) {
        Ok(store) => Ok(Some(store)),
        Err(MountOptionsError::NoSections) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Read `mount_options.conf` from the located configuration directory.
pub fn read_global_config(locator: &dyn ConfigLocator) -> Option<ConfigurationStore> {
    let path = locator.config_dir().join(GLOBAL_CONFIG_FILE_NAME);
    match load_config_file(&path) {
        Ok(store) => store,
        Err(e) => {
            warn!(
                "Error reading global mount options config file {:?}: {}",
                path, e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FixedConfigDir;
    use crate::model::{OptionField, TypeScope};
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "storage-mount-options-file-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn missing_file_is_no_override() {
        let dir = scratch_dir("missing");
        assert!(load_config_file(&dir.join(GLOBAL_CONFIG_FILE_NAME)).unwrap().is_none());
        assert!(read_global_config(&FixedConfigDir::new(&dir)).is_none());
    }

    #[test]
    fn empty_file_is_no_override() {
        let dir = scratch_dir("empty");
        fs::write(dir.join(GLOBAL_CONFIG_FILE_NAME), "\n").unwrap();
        assert!(load_config_file(&dir.join(GLOBAL_CONFIG_FILE_NAME)).unwrap().is_none());
    }

    #[test]
    fn broken_file_is_no_override() {
        let dir = scratch_dir("broken");
        fs::write(dir.join(GLOBAL_CONFIG_FILE_NAME), "[defaults\nallow=dev\n").unwrap();
        assert!(read_global_config(&FixedConfigDir::new(&dir)).is_none());
    }

    #[test]
    fn reads_overrides() {
        let dir = scratch_dir("valid");
        fs::write(
            dir.join(GLOBAL_CONFIG_FILE_NAME),
            "[defaults]\nvfat_defaults=ro,flush\n",
        )
        .unwrap();

        let store = read_global_config(&FixedConfigDir::new(&dir)).expect("overrides");
        let vfat = &store.any_device().unwrap()[&TypeScope::filesystem("vfat")];
        assert_eq!(vfat.field(OptionField::Defaults).unwrap(), ["ro", "flush"]);
    }
}
