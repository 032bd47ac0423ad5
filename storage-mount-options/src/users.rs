// SPDX-License-Identifier: GPL-3.0-only

//! User and group directory
//!
//! Resolves the caller's primary group and group memberships for the GID
//! self-check and for filling in `gid=` defaults.

use storage_sys::{lookup_user, supplementary_groups};

/// Passwd facts about a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub primary_gid: u32,
    pub name: String,
}

pub trait UserDirectory: Send + Sync {
    fn user_info(&self, uid: u32) -> Option<UserInfo>;

    /// Supplementary GIDs of `user_name`; `None` on lookup failure or when
    /// the list exceeds the lookup bound.
    fn supplementary_groups(&self, user_name: &str, primary_gid: u32) -> Option<Vec<u32>>;
}

/// Whether `uid` is a member of `gid`, by primary group or supplementary list.
pub fn is_uid_in_gid(users: &dyn UserDirectory, uid: u32, gid: u32) -> bool {
    let Some(user) = users.user_info(uid) else {
        tracing::warn!("Error looking up user with uid {}", uid);
        return false;
    };

    if user.primary_gid == gid {
        return true;
    }

    users
        .supplementary_groups(&user.name, user.primary_gid)
        .is_some_and(|groups| groups.contains(&gid))
}

/// Directory backed by the system passwd/group databases
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemUserDirectory;

impl UserDirectory for SystemUserDirectory {
    fn user_info(&self, uid: u32) -> Option<UserInfo> {
        lookup_user(uid).map(|user| UserInfo {
            primary_gid: user.primary_gid,
            name: user.name,
        })
    }

    fn supplementary_groups(&self, user_name: &str, primary_gid: u32) -> Option<Vec<u32>> {
        supplementary_groups(user_name, primary_gid)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use super::*;

    /// Fixed user table for tests
    #[derive(Debug, Default)]
    pub(crate) struct StaticUsers {
        users: HashMap<u32, (UserInfo, Option<Vec<u32>>)>,
    }

    impl StaticUsers {
        pub(crate) fn with_user(
            mut self,
            uid: u32,
            name: &str,
            primary_gid: u32,
            groups: Option<Vec<u32>>,
        ) -> Self {
            self.users.insert(
                uid,
                (
                    UserInfo {
                        primary_gid,
                        name: name.to_string(),
                    },
                    groups,
                ),
            );
            self
        }
    }

    impl UserDirectory for StaticUsers {
        fn user_info(&self, uid: u32) -> Option<UserInfo> {
            self.users.get(&uid).map(|(info, _)| info.clone())
        }

        fn supplementary_groups(&self, user_name: &str, _primary_gid: u32) -> Option<Vec<u32>> {
            self.users
                .values()
                .find(|(info, _)| info.name == user_name)
                .and_then(|(_, groups)| groups.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StaticUsers;
    use super::*;

    fn directory() -> StaticUsers {
        StaticUsers::default()
            .with_user(1000, "alice", 1000, Some(vec![1000, 10, 100]))
            .with_user(1001, "bob", 1001, None)
    }

    #[test]
    fn primary_group_matches() {
        assert!(is_uid_in_gid(&directory(), 1000, 1000));
        assert!(is_uid_in_gid(&directory(), 1001, 1001));
    }

    #[test]
    fn supplementary_group_matches() {
        assert!(is_uid_in_gid(&directory(), 1000, 10));
        assert!(!is_uid_in_gid(&directory(), 1000, 0));
    }

    #[test]
    fn failed_group_lookup_is_not_member() {
        assert!(!is_uid_in_gid(&directory(), 1001, 100));
    }

    #[test]
    fn unknown_user_is_not_member() {
        assert!(!is_uid_in_gid(&directory(), 4242, 4242));
    }

    #[test]
    fn system_directory_knows_root() {
        let root = SystemUserDirectory.user_info(0).expect("root entry");
        assert_eq!(root.primary_gid, 0);
        assert!(is_uid_in_gid(&SystemUserDirectory, 0, 0));
    }
}
