// SPDX-License-Identifier: GPL-3.0-only

//! Configuration sources
//!
//! Three producers feed the resolution engine, lowest precedence first:
//! the compiled-in policy, the administrator's `mount_options.conf` and the
//! `UDISKS_MOUNT_OPTIONS_*` properties udev reports for the device.

pub mod builtin;
pub mod file;
pub mod hints;
pub mod keyfile;

use tracing::{debug, warn};

use crate::model::{TypeOptions, decode_key};
use crate::options::tokenize;

pub use builtin::{BUILTIN_RESOURCE, load_builtin, parse_builtin};
pub use file::{GLOBAL_CONFIG_FILE_NAME, load_config_file, read_global_config};
pub use hints::{HINT_PROPERTY_PREFIX, hints_from_properties, read_device_hints};
pub use keyfile::parse_key_file;

/// Decode `key` and store the tokenized `value` in the matching field.
///
/// `key` must already be lower-cased. Unknown keys and malformed values are
/// dropped; a key decoding to a field that is already set replaces it.
pub(crate) fn apply_key_value(options: &mut TypeOptions, key: &str, value: &str) {
    let Some((type_scope, field)) = decode_key(key) else {
        debug!("Ignoring garbage mount options key: {}", key);
        return;
    };

    let tokens = match tokenize(value) {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!("{}, ignoring key '{}'", e, key);
            return;
        }
    };

    let entry = options.entry(type_scope).or_default();
    let values = tokens.iter().map(ToString::to_string).collect();
    if entry.set_field(field, values).is_some() {
        warn!("Duplicate mount options key '{}' detected", key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OptionField, TypeScope};

    #[test]
    fn stores_tokens_under_decoded_field() {
        let mut options = TypeOptions::new();
        apply_key_value(&mut options, "vfat_defaults", "uid=,gid=,flush");
        apply_key_value(&mut options, "allow", "ro,rw");

        let vfat = &options[&TypeScope::filesystem("vfat")];
        assert_eq!(vfat.defaults(), ["uid=", "gid=", "flush"]);
        assert_eq!(
            options[&TypeScope::Any].field(OptionField::Allow).unwrap(),
            ["ro", "rw"]
        );
    }

    #[test]
    fn later_duplicate_wins() {
        let mut options = TypeOptions::new();
        apply_key_value(&mut options, "vfat_allow", "flush");
        apply_key_value(&mut options, "vfat_allow", "utf8");
        assert_eq!(
            options[&TypeScope::filesystem("vfat")].field(OptionField::Allow).unwrap(),
            ["utf8"]
        );
    }

    #[test]
    fn drops_garbage_keys_and_malformed_values() {
        let mut options = TypeOptions::new();
        apply_key_value(&mut options, "vfat_options", "flush");
        apply_key_value(&mut options, "vfat_allow", "context=\"unterminated");
        assert!(options.is_empty());
    }

    #[test]
    fn empty_value_sets_an_empty_field() {
        let mut options = TypeOptions::new();
        apply_key_value(&mut options, "defaults", "");
        assert_eq!(options[&TypeScope::Any].defaults, Some(Vec::new()));
    }
}
