// SPDX-License-Identifier: GPL-3.0-only

//! Default option synthesis
//!
//! Turns the effective `defaults` list into concrete options for one
//! caller and appends the options the caller asked for.

use tracing::warn;

use crate::error::Result;
use crate::model::{FilesystemOptionSet, OptionField};
use crate::options::{MountOption, OptionValue, tokenize};
use crate::users::UserDirectory;

/// `dmode` used on shared filesystems
pub const SHARED_DIR_MODE: &str = "0555";

/// Expand the configured defaults for `caller_uid`.
pub fn default_options(
    set: &FilesystemOptionSet,
    caller_uid: u32,
    shared_fs: bool,
    users: &dyn UserDirectory,
) -> Vec<MountOption> {
    let mut options = Vec::with_capacity(set.defaults().len());

    for spec in set.defaults() {
        let option = MountOption::from_spec(spec);
        let OptionValue::Value(value) = &option.value else {
            options.push(option);
            continue;
        };

        // a value pinned by the administrator is used as written
        if !value.is_empty() && set.contains(OptionField::Allow, spec) {
            options.push(option);
            continue;
        }

        match option.name.as_str() {
            "uid" => options.push(MountOption::with_value("uid", caller_uid.to_string())),
            "gid" => {
                if let Some(user) = users.user_info(caller_uid) {
                    options.push(MountOption::with_value("gid", user.primary_gid.to_string()));
                }
            }
            "mode" if shared_fs => match shared_mode(value) {
                Some(mode) => options.push(MountOption::with_value("mode", mode)),
                None => {
                    warn!("Cannot relax unexpected mode value '{}' for shared mount", value);
                    options.push(option);
                }
            },
            "dmode" if shared_fs => options.push(MountOption::with_value("dmode", SHARED_DIR_MODE)),
            _ => options.push(option),
        }
    }

    options
}

/// Give group and others the owner's permissions minus write, but at least read.
///
/// Works on the last three octal digits; `None` if there are not three.
pub fn shared_mode(mode: &str) -> Option<String> {
    if mode.len() < 3 || !mode.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return None;
    }

    let owner_at = mode.len() - 3;
    let owner = mode.as_bytes()[owner_at] - b'0';
    let relaxed = char::from(b'0' + owner.saturating_sub(2).max(4));

    let mut shared = mode[..=owner_at].to_string();
    shared.push(relaxed);
    shared.push(relaxed);
    Some(shared)
}

/// Defaults followed by the caller's own options, in order.
///
/// A caller option string that does not tokenize is rejected.
pub fn synthesize(
    set: &FilesystemOptionSet,
    caller_uid: u32,
    caller_options: Option<&str>,
    shared_fs: bool,
    users: &dyn UserDirectory,
) -> Result<Vec<MountOption>> {
    let mut options = default_options(set, caller_uid, shared_fs, users);
    if let Some(requested) = caller_options {
        options.extend(tokenize(requested)?);
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MountOptionsError;
    use crate::users::testing::StaticUsers;

    fn users() -> StaticUsers {
        StaticUsers::default().with_user(1000, "alice", 100, None)
    }

    fn with_defaults(defaults: &[&str]) -> FilesystemOptionSet {
        FilesystemOptionSet::default().with_field(OptionField::Defaults, defaults.iter().copied())
    }

    #[test]
    fn fills_in_caller_ids() {
        let set = with_defaults(&["uid=$UID", "gid=$GID", "shortname=mixed", "flush"]);
        let options = default_options(&set, 1000, false, &users());
        assert_eq!(
            options,
            vec![
                MountOption::with_value("uid", "1000"),
                MountOption::with_value("gid", "100"),
                MountOption::with_value("shortname", "mixed"),
                MountOption::flag("flush"),
            ]
        );
    }

    #[test]
    fn skips_gid_for_unknown_user() {
        let set = with_defaults(&["uid=", "gid="]);
        let options = default_options(&set, 4242, false, &users());
        assert_eq!(options, vec![MountOption::with_value("uid", "4242")]);
    }

    #[test]
    fn pinned_defaults_are_used_verbatim() {
        let set = with_defaults(&["uid=0", "mode=0700"])
            .with_field(OptionField::Allow, ["uid=0", "mode=0700"]);
        let options = default_options(&set, 1000, true, &users());
        assert_eq!(
            options,
            vec![
                MountOption::with_value("uid", "0"),
                MountOption::with_value("mode", "0700"),
            ]
        );
    }

    #[test]
    fn bare_allow_entry_does_not_pin_a_value() {
        let set = with_defaults(&["uid=$UID"]).with_field(OptionField::Allow, ["uid"]);
        let options = default_options(&set, 1000, false, &users());
        assert_eq!(options, vec![MountOption::with_value("uid", "1000")]);
    }

    #[test]
    fn relaxes_modes_on_shared_filesystems() {
        let set = with_defaults(&["mode=0777", "dmode=0500"]);
        let options = default_options(&set, 1000, true, &users());
        assert_eq!(
            options,
            vec![
                MountOption::with_value("mode", "0755"),
                MountOption::with_value("dmode", "0555"),
            ]
        );

        let options = default_options(&set, 1000, false, &users());
        assert_eq!(
            options,
            vec![
                MountOption::with_value("mode", "0777"),
                MountOption::with_value("dmode", "0500"),
            ]
        );
    }

    #[test]
    fn shared_mode_floors_at_read() {
        assert_eq!(shared_mode("0777").as_deref(), Some("0755"));
        assert_eq!(shared_mode("0700").as_deref(), Some("0755"));
        assert_eq!(shared_mode("0644").as_deref(), Some("0644"));
        assert_eq!(shared_mode("0400").as_deref(), Some("0444"));
        assert_eq!(shared_mode("0500").as_deref(), Some("0544"));
        assert_eq!(shared_mode("0000").as_deref(), Some("0044"));
        assert_eq!(shared_mode("700").as_deref(), Some("755"));
        assert_eq!(shared_mode("07"), None);
        assert_eq!(shared_mode("0x77"), None);
    }

    #[test]
    fn caller_options_follow_defaults() {
        let set = with_defaults(&["flush"]);
        let options =
            synthesize(&set, 1000, Some("ro,umask=077,ro"), false, &users()).unwrap();
        assert_eq!(
            options,
            vec![
                MountOption::flag("flush"),
                MountOption::flag("ro"),
                MountOption::with_value("umask", "077"),
                MountOption::flag("ro"),
            ]
        );
    }

    #[test]
    fn malformed_caller_options_are_rejected() {
        let set = with_defaults(&[]);
        assert!(matches!(
            synthesize(&set, 1000, Some("ro,context=\"x"), false, &users()),
            Err(MountOptionsError::MalformedOptions { .. })
        ));
    }
}
