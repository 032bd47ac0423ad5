// SPDX-License-Identifier: GPL-3.0-only

//! Section/key parsing shared by the built-in and administrator files
//!
//! ```ini
//! [defaults]
//! vfat_defaults=uid=$UID,gid=$GID,flush
//!
//! [/dev/disk/by-label/CAMERA]
//! vfat_defaults=ro,uid=$UID
//! ```

use configparser::ini::Ini;
use tracing::warn;

use super::apply_key_value;
use crate::error::{MountOptionsError, Result};
use crate::model::{ConfigurationStore, DeviceScope, TypeOptions};

// Where configparser files keys that appear before any section header
const ORPHAN_SECTION: &str = "default";

fn new_parser() -> Ini {
    // Section names are device paths, so keep their case; keys are
    // lower-cased per entry below.
    let mut defaults = Ini::new_cs().defaults();
    defaults.default_section = ORPHAN_SECTION.to_string();
    defaults.delimiters = vec!['='];
    // comments only at the start of a line; `#` and `;` are legal in
    // device labels and option values
    defaults.comment_symbols = vec!['#', ';'];
    defaults.enable_inline_comments = false;
    Ini::new_from_defaults(defaults)
}

/// Parse configuration text into a two-level store.
///
/// Fails with [`MountOptionsError::NoSections`] when the text holds no
/// section at all and [`MountOptionsError::ConfigParse`] when it is not
/// valid key file syntax.
pub fn parse_key_file(text: &str) -> Result<ConfigurationStore> {
    let mut parser = new_parser();
    let sections = parser
        .read(text.to_string())
        .map_err(MountOptionsError::ConfigParse)?;

    let mut store = ConfigurationStore::new();
    for (section, keys) in sections.iter() {
        if section == ORPHAN_SECTION {
            if !keys.is_empty() {
                warn!(
                    "Ignoring {} mount options key(s) outside of any section",
                    keys.len()
                );
            }
            continue;
        }

        let mut options = TypeOptions::new();
        for (key, value) in keys.iter() {
            let key = key.to_ascii_lowercase();
            match value {
                Some(value) => apply_key_value(&mut options, &key, value),
                None => warn!(
                    "Cannot retrieve value for mount options key '{}' in section [{}]",
                    key, section
                ),
            }
        }

        store.insert(DeviceScope::from_section(section), options);
    }

    if store.is_empty() {
        return Err(MountOptionsError::NoSections);
    }

    Ok(store)
}
