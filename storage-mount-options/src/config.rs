// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

/// System configuration directory holding `mount_options.conf`
pub const DEFAULT_CONFIG_DIR: &str = "/etc/udisks2";

/// Locates the directory the administrator override file lives in
pub trait ConfigLocator: Send + Sync {
    fn config_dir(&self) -> PathBuf;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedConfigDir(PathBuf);

impl FixedConfigDir {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self(dir.as_ref().to_path_buf())
    }

    pub fn system() -> Self {
        Self::new(DEFAULT_CONFIG_DIR)
    }
}

impl Default for FixedConfigDir {
    fn default() -> Self {
        Self::system()
    }
}

impl ConfigLocator for FixedConfigDir {
    fn config_dir(&self) -> PathBuf {
        self.0.clone()
    }
}
