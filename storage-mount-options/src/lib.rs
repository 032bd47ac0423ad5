// SPDX-License-Identifier: GPL-3.0-only

//! Mount option resolution and policy
//!
//! Computes the option string a privileged daemon hands to `mount(2)` on
//! behalf of an unprivileged caller:
//!
//! - layer the built-in policy, the administrator's `mount_options.conf`
//!   and device hints into one effective option set
//! - expand configured defaults for the caller (UID/GID, shared modes)
//! - refuse any option the effective policy does not allow

mod assemble;
mod engine;
mod resolve;
mod synth;

pub mod config;
pub mod device;
pub mod error;
pub mod model;
pub mod options;
pub mod policy;
pub mod source;
pub mod users;

pub use assemble::{SAFETY_OPTIONS, compute_mount_string};
pub use config::{ConfigLocator, DEFAULT_CONFIG_DIR, FixedConfigDir};
pub use device::{
    BlockDevice, DeviceIdentity, DeviceProperties, DeviceRecord, SHARED_FILESYSTEM_PROPERTY,
    property_as_bool,
};
pub use engine::MountOptionsEngine;
pub use error::{MountOptionsError, Rejection, Result};
pub use model::{
    ConfigurationStore, DeviceScope, FilesystemOptionSet, OptionField, TypeOptions, TypeScope,
    additive_merge, decode_key, override_merge,
};
pub use options::{MountOption, OptionValue, tokenize};
pub use policy::PolicyEvaluator;
pub use resolve::{Layer, WorkingPair, resolve};
pub use synth::{default_options, shared_mode, synthesize};
pub use users::{SystemUserDirectory, UserDirectory, UserInfo, is_uid_in_gid};
