// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system access for mount option policy
//!
//! This crate wraps the pieces of the host system the mount policy needs
//! without going through D-Bus:
//! - passwd/group database lookups for a calling UID
//! - the udev database record of a block device
//!
//! Both are plain synchronous local reads.

pub mod error;
pub mod udev;
pub mod users;

pub use error::{Result, SysError};
pub use udev::UdevRecord;
pub use users::{MAX_SUPPLEMENTARY_GROUPS, UnixUser, lookup_user, supplementary_groups};
