// SPDX-License-Identifier: GPL-3.0-only

//! Device collaborators
//!
//! The resolution engine needs two things from a block device: its identity
//! (node path and symlinks, to match device-specific sections) and its flat
//! property map (mount option hints and the shared-filesystem flag).

use std::collections::BTreeMap;

use storage_sys::UdevRecord;

use crate::error::{MountOptionsError, Result};

/// Property marking a filesystem that is mounted at a location shared by all users
pub const SHARED_FILESYSTEM_PROPERTY: &str = "UDISKS_FILESYSTEM_SHARED";

pub trait DeviceIdentity: Send + Sync {
    /// Device node, e.g. `/dev/sdb1`
    fn device_path(&self) -> &str;

    /// Symlinks pointing at the node, e.g. `/dev/disk/by-uuid/...`
    fn symlinks(&self) -> &[String];
}

pub trait DeviceProperties: Send + Sync {
    /// All properties of the device.
    ///
    /// Fails with [`MountOptionsError::DeviceUnavailable`] when the
    /// underlying device handle is not valid.
    fn properties(&self) -> Result<BTreeMap<String, String>>;
}

/// Read `name` from a property map with udev boolean semantics: `1` or
/// `true` (any case). Absent means false.
pub fn property_as_bool(properties: &BTreeMap<String, String>, name: &str) -> bool {
    properties
        .get(name)
        .is_some_and(|value| value == "1" || value.eq_ignore_ascii_case("true"))
}

/// Everything the engine asks of a device
pub trait BlockDevice: DeviceIdentity + DeviceProperties {
    fn as_identity(&self) -> &dyn DeviceIdentity;
    fn as_properties(&self) -> &dyn DeviceProperties;
}

impl<T: DeviceIdentity + DeviceProperties> BlockDevice for T {
    fn as_identity(&self) -> &dyn DeviceIdentity {
        self
    }

    fn as_properties(&self) -> &dyn DeviceProperties {
        self
    }
}

/// In-memory device description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRecord {
    pub device: String,
    pub symlinks: Vec<String>,
    /// `None` when the device handle is gone
    pub properties: Option<BTreeMap<String, String>>,
}

impl DeviceRecord {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            symlinks: Vec::new(),
            properties: Some(BTreeMap::new()),
        }
    }

    /// A device whose properties cannot be read
    pub fn unavailable(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            symlinks: Vec::new(),
            properties: None,
        }
    }

    pub fn with_symlink(mut self, symlink: impl Into<String>) -> Self {
        self.symlinks.push(symlink.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }
}

impl DeviceIdentity for DeviceRecord {
    fn device_path(&self) -> &str {
        &self.device
    }

    fn symlinks(&self) -> &[String] {
        &self.symlinks
    }
}

impl DeviceProperties for DeviceRecord {
    fn properties(&self) -> Result<BTreeMap<String, String>> {
        self.properties
            .clone()
            .ok_or_else(|| MountOptionsError::DeviceUnavailable(self.device.clone()))
    }
}

impl From<UdevRecord> for DeviceRecord {
    fn from(record: UdevRecord) -> Self {
        Self {
            device: record.device,
            symlinks: record.symlinks,
            properties: Some(record.properties),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_properties_follow_udev() {
        let properties = DeviceRecord::new("/dev/sdb1")
            .with_property("A", "1")
            .with_property("B", "TRUE")
            .with_property("C", "yes")
            .with_property("D", "0")
            .properties()
            .unwrap();

        assert!(property_as_bool(&properties, "A"));
        assert!(property_as_bool(&properties, "B"));
        assert!(!property_as_bool(&properties, "C"));
        assert!(!property_as_bool(&properties, "D"));
        assert!(!property_as_bool(&properties, "MISSING"));
        assert!(DeviceRecord::unavailable("/dev/sdb1").properties().is_err());
    }

    #[test]
    fn converts_udev_records() {
        let record = storage_sys::udev::parse_record(
            "/dev/sdb1",
            "S:disk/by-label/STICK\nE:UDISKS_FILESYSTEM_SHARED=1\n",
        )
        .unwrap();

        let device = DeviceRecord::from(record);
        assert_eq!(device.device_path(), "/dev/sdb1");
        assert_eq!(device.symlinks(), ["/dev/disk/by-label/STICK"]);
        assert!(property_as_bool(
            &device.properties().unwrap(),
            SHARED_FILESYSTEM_PROPERTY
        ));
    }
}
