// SPDX-License-Identifier: GPL-3.0-only

//! Public entry points
//!
//! [`MountOptionsEngine`] owns the parsed built-in policy for the lifetime of
//! the daemon and resolves each request against fresh copies of the
//! administrator file and the device hints. It holds no other state, so one
//! engine can serve concurrent requests.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::assemble::compute_mount_string;
use crate::config::{ConfigLocator, FixedConfigDir};
use crate::device::{BlockDevice, DeviceIdentity, SHARED_FILESYSTEM_PROPERTY, property_as_bool};
use crate::error::Result;
use crate::model::{ConfigurationStore, FilesystemOptionSet, TypeOptions};
use crate::policy::PolicyEvaluator;
use crate::resolve::{Layer, resolve};
use crate::source::{hints_from_properties, load_builtin, read_device_hints, read_global_config};
use crate::synth::synthesize;
use crate::users::{SystemUserDirectory, UserDirectory};

#[derive(Clone)]
pub struct MountOptionsEngine {
    builtin: Arc<ConfigurationStore>,
    users: Arc<dyn UserDirectory>,
    config: Arc<dyn ConfigLocator>,
}

impl MountOptionsEngine {
    pub fn new(
        builtin: Arc<ConfigurationStore>,
        users: Arc<dyn UserDirectory>,
        config: Arc<dyn ConfigLocator>,
    ) -> Self {
        Self {
            builtin,
            users,
            config,
        }
    }

    /// Engine backed by the embedded policy, the system user database and
    /// the given configuration directory.
    ///
    /// An error here means the built-in policy is corrupt and the caller
    /// must not continue.
    pub fn with_config_dir(config: FixedConfigDir) -> Result<Self> {
        Ok(Self::new(
            Arc::new(load_builtin()?),
            Arc::new(SystemUserDirectory),
            Arc::new(config),
        ))
    }

    pub fn system() -> Result<Self> {
        Self::with_config_dir(FixedConfigDir::system())
    }

    /// Layer the configuration sources for `device` without any policy check.
    pub fn compute_effective_mount_options(
        &self,
        device: &dyn BlockDevice,
        fs_type: Option<&str>,
    ) -> FilesystemOptionSet {
        let hints = match read_device_hints(device.as_properties()) {
            Ok(hints) => Some(hints),
            Err(e) => {
                warn!("Error getting udev mount options: {}", e);
                None
            }
        };

        self.layered(device.as_identity(), hints.as_ref(), fs_type)
    }

    fn layered(
        &self,
        device: &dyn DeviceIdentity,
        hints: Option<&TypeOptions>,
        fs_type: Option<&str>,
    ) -> FilesystemOptionSet {
        let global = read_global_config(self.config.as_ref());

        let mut layers = vec![Layer::Builtin(&self.builtin)];
        if let Some(global) = &global {
            layers.push(Layer::Global(global));
        }
        if let Some(hints) = hints {
            layers.push(Layer::Hints(hints));
        }

        resolve(&layers, Some(device), fs_type)
    }

    /// Compute the validated mount option string for `caller_uid`.
    ///
    /// Fails with the first option the caller is not allowed to use, or
    /// with [`MountOptionsError::DeviceUnavailable`] when the device
    /// properties cannot be read.
    ///
    /// [`MountOptionsError::DeviceUnavailable`]: crate::error::MountOptionsError::DeviceUnavailable
    pub fn calculate_mount_options(
        &self,
        device: &dyn BlockDevice,
        caller_uid: u32,
        fs_type: Option<&str>,
        caller_options: Option<&str>,
    ) -> Result<String> {
        let properties = device.properties()?;
        let shared_fs = property_as_bool(&properties, SHARED_FILESYSTEM_PROPERTY);
        let hints = hints_from_properties(&properties);
        let effective = self.layered(device.as_identity(), Some(&hints), fs_type);

        let options = synthesize(
            &effective,
            caller_uid,
            caller_options,
            shared_fs,
            self.users.as_ref(),
        )?;

        let policy = PolicyEvaluator::new(&effective, self.users.as_ref());
        let assembled = compute_mount_string(&policy, caller_uid, &options)?;
        debug!(
            "Mount options for {} (uid {}): {}",
            device.device_path(),
            caller_uid,
            assembled
        );
        Ok(assembled)
    }
}
