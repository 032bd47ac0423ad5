// SPDX-License-Identifier: GPL-3.0-only

//! Final option string assembly
//!
//! Every synthesized option is checked and appended after the fixed safety
//! options. The first refused option aborts the whole request; no partial
//! string is ever returned.

use crate::error::{MountOptionsError, Rejection, Result};
use crate::options::{MountOption, join};
use crate::policy::PolicyEvaluator;

/// Always passed to the kernel and never subject to policy
pub const SAFETY_OPTIONS: &str = "uhelper=udisks2,nodev,nosuid";

/// Validate `options` in order and build the mount option string.
pub fn compute_mount_string(
    policy: &PolicyEvaluator<'_>,
    caller_uid: u32,
    options: &[MountOption],
) -> Result<String> {
    for option in options {
        // "shortname=lower,uid=0" smuggled in as one option; the kernel
        // splits on an escaped comma too
        let escaped_comma = option.value.as_str().is_some_and(|v| v.contains("\\,"));
        if option.name.contains(',') || escaped_comma {
            return Err(MountOptionsError::OptionNotPermitted {
                option: option.to_string(),
                reason: Rejection::Malformed,
            });
        }

        if !policy.is_allowed(&option.name, &option.value, caller_uid) {
            return Err(MountOptionsError::OptionNotPermitted {
                option: option.to_string(),
                reason: Rejection::NotAllowed,
            });
        }
    }

    if options.is_empty() {
        return Ok(SAFETY_OPTIONS.to_string());
    }
    Ok(format!("{SAFETY_OPTIONS},{}", join(options)))
}
