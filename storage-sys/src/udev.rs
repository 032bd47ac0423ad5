// SPDX-License-Identifier: GPL-3.0-only

//! Read-only access to the udev database
//!
//! udevd keeps one record per device under `/run/udev/data`, named
//! `b<major>:<minor>` for block devices. Each line is `<tag>:<payload>`;
//! `E:` lines carry `KEY=VALUE` properties and `S:` lines carry symlinks
//! relative to `/dev`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SysError};

pub const UDEV_DATA_DIR: &str = "/run/udev/data";

/// Properties and symlinks udev recorded for one block device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UdevRecord {
    /// Canonical device node, e.g. `/dev/sdb1`
    pub device: String,
    /// Absolute symlink paths, in database order
    pub symlinks: Vec<String>,
    pub properties: BTreeMap<String, String>,
}

impl UdevRecord {
    /// Load the record for the block device at `path` (a node or a symlink to one).
    pub fn for_device(path: &Path) -> Result<Self> {
        Self::for_device_in(Path::new(UDEV_DATA_DIR), path)
    }

    pub fn for_device_in(data_dir: &Path, path: &Path) -> Result<Self> {
        let canonical = fs::canonicalize(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SysError::DeviceNotFound(path.display().to_string()),
            _ => SysError::Io(e),
        })?;

        let metadata = fs::metadata(&canonical)?;
        if !metadata.file_type().is_block_device() {
            return Err(SysError::DeviceNotFound(format!(
                "{} is not a block device",
                canonical.display()
            )));
        }

        let (major, minor) = split_dev(metadata.rdev());
        let record_path: PathBuf = data_dir.join(format!("b{major}:{minor}"));
        debug!("Reading udev record {:?} for {:?}", record_path, canonical);

        let content = fs::read_to_string(&record_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SysError::DeviceNotFound(format!(
                "no udev record for {}",
                canonical.display()
            )),
            _ => SysError::Io(e),
        })?;

        parse_record(&canonical.to_string_lossy(), &content)
    }
}

/// Parse the text of one udev database record.
pub fn parse_record(device: &str, content: &str) -> Result<UdevRecord> {
    let mut record = UdevRecord {
        device: device.to_string(),
        ..Default::default()
    };

    for line in content.lines().filter(|line| !line.is_empty()) {
        let (tag, payload) = line
            .split_once(':')
            .ok_or_else(|| SysError::InvalidUdevLine(line.to_string()))?;

        match tag {
            "E" => {
                let (key, value) = payload
                    .split_once('=')
                    .ok_or_else(|| SysError::InvalidUdevLine(line.to_string()))?;
                record.properties.insert(key.to_string(), value.to_string());
            }
            "S" => record.symlinks.push(format!("/dev/{payload}")),
            _ => {}
        }
    }

    Ok(record)
}

fn split_dev(dev: u64) -> (u32, u32) {
    let dev = dev as libc::dev_t;
    (libc::major(dev), libc::minor(dev))
}
