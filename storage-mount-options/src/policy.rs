// SPDX-License-Identifier: GPL-3.0-only

//! Mount option policy
//!
//! Decides whether a caller may pass a single option. Rules are tried in
//! order and the first one that applies decides:
//!
//! 1. `name=value` listed verbatim in `allow` (administrator pinned value)
//! 2. `name` in `allow_uid_self`: the value must be the caller's UID
//! 3. `name` in `allow_gid_self`: the value must be a GID the caller is in
//! 4. `name=` in `allow`: any value
//! 5. `name` in `allow`: any value
//! 6. `x-` prefixed userspace options
//!
//! An option governed by rule 2 or 3 is never re-tested against 4 and 5.

use tracing::warn;

use crate::model::{FilesystemOptionSet, OptionField};
use crate::options::OptionValue;
use crate::users::{UserDirectory, is_uid_in_gid};

/// Prefix of userspace options the kernel never interprets
pub const USERSPACE_OPTION_PREFIX: &str = "x-";

/// Evaluates options against one effective option set
pub struct PolicyEvaluator<'a> {
    set: &'a FilesystemOptionSet,
    users: &'a dyn UserDirectory,
}

impl<'a> PolicyEvaluator<'a> {
    pub fn new(set: &'a FilesystemOptionSet, users: &'a dyn UserDirectory) -> Self {
        Self { set, users }
    }

    pub fn is_allowed(&self, name: &str, value: &OptionValue, caller_uid: u32) -> bool {
        if let Some(value) = value.non_empty() {
            if self.set.contains(OptionField::Allow, &format!("{name}={value}")) {
                return true;
            }
        }

        if self.set.contains(OptionField::AllowUidSelf, name) {
            return match self_check_id(name, value, OptionField::AllowUidSelf) {
                Some(uid) => uid == caller_uid,
                None => false,
            };
        }

        if self.set.contains(OptionField::AllowGidSelf, name) {
            return match self_check_id(name, value, OptionField::AllowGidSelf) {
                Some(gid) => is_uid_in_gid(self.users, caller_uid, gid),
                None => false,
            };
        }

        if self.set.contains(OptionField::Allow, &format!("{name}="))
            || self.set.contains(OptionField::Allow, name)
        {
            return true;
        }

        name.starts_with(USERSPACE_OPTION_PREFIX)
    }
}

fn self_check_id(name: &str, value: &OptionValue, field: OptionField) -> Option<u32> {
    let Some(value) = value.non_empty() else {
        warn!(
            "Mount option '{}' is listed within {} but has no value",
            name,
            field.key()
        );
        return None;
    };
    parse_id(value)
}

/// Parse a decimal UID/GID; anything but plain digits is rejected.
pub fn parse_id(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
