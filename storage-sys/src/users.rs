// SPDX-License-Identifier: GPL-3.0-only

//! passwd and group database lookups
//!
//! Used to answer "which groups does this caller belong to" when a mount
//! option value has to match one of the caller's GIDs.

use std::ffi::{CStr, CString};

/// Upper bound on the supplementary group list fetched for a user.
///
/// A user in more groups than this is reported as "not found" rather than
/// growing the buffer.
pub const MAX_SUPPLEMENTARY_GROUPS: usize = 128;

const PASSWD_BUFFER_START: usize = 4096;
const PASSWD_BUFFER_MAX: usize = 1 << 20;

/// A resolved passwd entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnixUser {
    pub uid: u32,
    pub primary_gid: u32,
    pub name: String,
}

/// Look up the passwd entry for `uid`.
///
/// Returns `None` when the UID has no entry or the entry is not valid UTF-8.
pub fn lookup_user(uid: u32) -> Option<UnixUser> {
    let mut buffer = vec![0_u8; PASSWD_BUFFER_START];

    loop {
        let mut pwd = std::mem::MaybeUninit::<libc::passwd>::uninit();
        let mut pwd_ptr: *mut libc::passwd = std::ptr::null_mut();

        let result = unsafe {
            libc::getpwuid_r(
                uid as libc::uid_t,
                pwd.as_mut_ptr(),
                buffer.as_mut_ptr() as *mut libc::c_char,
                buffer.len(),
                &mut pwd_ptr,
            )
        };

        if result == libc::ERANGE && buffer.len() < PASSWD_BUFFER_MAX {
            let grown = buffer.len() * 2;
            buffer.resize(grown, 0);
            continue;
        }

        if result != 0 || pwd_ptr.is_null() {
            tracing::warn!("Failed to resolve passwd entry for UID {}", uid);
            return None;
        }

        let passwd = unsafe { pwd.assume_init() };
        let name = unsafe { CStr::from_ptr(passwd.pw_name) };
        let Ok(name) = name.to_str() else {
            tracing::warn!("User name for UID {} is not valid UTF-8", uid);
            return None;
        };

        return Some(UnixUser {
            uid,
            primary_gid: passwd.pw_gid as u32,
            name: name.to_string(),
        });
    }
}

/// Supplementary groups of `user_name`, including `primary_gid`.
///
/// Returns `None` if the lookup fails or the user belongs to more than
/// [`MAX_SUPPLEMENTARY_GROUPS`] groups.
pub fn supplementary_groups(user_name: &str, primary_gid: u32) -> Option<Vec<u32>> {
    let Ok(name) = CString::new(user_name) else {
        tracing::warn!("User name {:?} contains a NUL byte", user_name);
        return None;
    };

    let mut groups = vec![0 as libc::gid_t; MAX_SUPPLEMENTARY_GROUPS];
    let mut ngroups = MAX_SUPPLEMENTARY_GROUPS as libc::c_int;

    let result = unsafe {
        libc::getgrouplist(
            name.as_ptr(),
            primary_gid as libc::gid_t,
            groups.as_mut_ptr(),
            &mut ngroups,
        )
    };

    if result < 0 {
        tracing::warn!(
            "Error getting supplementary groups for user {}: more than {} groups or lookup failure",
            user_name,
            MAX_SUPPLEMENTARY_GROUPS
        );
        return None;
    }

    groups.truncate(ngroups.max(0) as usize);
    Some(groups.into_iter().map(|gid| gid as u32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_a_passwd_entry() {
        let root = lookup_user(0).expect("root should exist");
        assert_eq!(root.uid, 0);
        assert_eq!(root.primary_gid, 0);
        assert_eq!(root.name, "root");
    }

    #[test]
    fn group_list_contains_primary_group() {
        let groups = supplementary_groups("root", 0).expect("lookup should succeed");
        assert!(groups.contains(&0));
        assert!(groups.len() <= MAX_SUPPLEMENTARY_GROUPS);
    }

    #[test]
    fn nul_in_user_name_is_not_found() {
        assert_eq!(supplementary_groups("ro\0ot", 0), None);
    }
}
