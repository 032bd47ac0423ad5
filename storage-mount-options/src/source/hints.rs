// SPDX-License-Identifier: GPL-3.0-only

//! Mount option hints reported by the device
//!
//! A udev rule can set e.g. `UDISKS_MOUNT_OPTIONS_VFAT_DEFAULTS=ro` on a
//! device; the part after the prefix is decoded like a configuration key.

use std::collections::BTreeMap;

use super::apply_key_value;
use crate::device::DeviceProperties;
use crate::error::Result;
use crate::model::TypeOptions;

pub const HINT_PROPERTY_PREFIX: &str = "UDISKS_MOUNT_OPTIONS_";

/// Collect hint properties into a single-level store.
///
/// Fails only when the device properties cannot be read at all.
pub fn read_device_hints(device: &dyn DeviceProperties) -> Result<TypeOptions> {
    Ok(hints_from_properties(&device.properties()?))
}

/// Collect hint properties from an already fetched property map.
pub fn hints_from_properties(properties: &BTreeMap<String, String>) -> TypeOptions {
    let mut options = TypeOptions::new();
    for (name, value) in properties {
        if let Some(key) = name.strip_prefix(HINT_PROPERTY_PREFIX) {
            apply_key_value(&mut options, &key.to_ascii_lowercase(), value);
        }
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceRecord;
    use crate::error::MountOptionsError;
    use crate::model::{OptionField, TypeScope};

    #[test]
    fn picks_prefixed_properties_only() {
        let device = DeviceRecord::new("/dev/sdb1")
            .with_property("ID_FS_TYPE", "vfat")
            .with_property("UDISKS_MOUNT_OPTIONS_VFAT_DEFAULTS", "ro,flush")
            .with_property("UDISKS_MOUNT_OPTIONS_ALLOW", "noexec")
            .with_property("UDISKS_MOUNT_OPTIONS_BOGUS", "dev");

        let options = read_device_hints(&device).unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(
            options[&TypeScope::filesystem("vfat")].defaults(),
            ["ro", "flush"]
        );
        assert_eq!(
            options[&TypeScope::Any].field(OptionField::Allow).unwrap(),
            ["noexec"]
        );
    }

    #[test]
    fn unavailable_device_fails() {
        let device = DeviceRecord::unavailable("/dev/sdb1");
        assert!(matches!(
            read_device_hints(&device),
            Err(MountOptionsError::DeviceUnavailable(_))
        ));
    }
}
