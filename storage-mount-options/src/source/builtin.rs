// SPDX-License-Identifier: GPL-3.0-only

//! Compiled-in mount option policy
//!
//! The policy text ships inside the binary. It is not user controlled, so
//! any failure to read or parse it means the daemon must not start.

use rust_embed::RustEmbed;
use tracing::error;

use super::keyfile::parse_key_file;
use crate::error::{MountOptionsError, Result};
use crate::model::{ConfigurationStore, TypeScope};

pub const BUILTIN_RESOURCE: &str = "builtin_mount_options.conf";

#[derive(RustEmbed)]
#[folder = "data/"]
struct BuiltinResources;

/// Load and parse the embedded policy.
pub fn load_builtin() -> Result<ConfigurationStore> {
    let Some(resource) = BuiltinResources::get(BUILTIN_RESOURCE) else {
        error!("Failed to read built-in mount options resource {}", BUILTIN_RESOURCE);
        return Err(MountOptionsError::ConfigParse(format!(
            "built-in resource {BUILTIN_RESOURCE} is missing"
        )));
    };

    let text = std::str::from_utf8(&resource.data).map_err(|e| {
        error!("Built-in mount options are not valid UTF-8: {}", e);
        MountOptionsError::ConfigParse(e.to_string())
    })?;

    parse_builtin(text)
}

/// Parse policy text with the built-in strictness rules: it must parse and
/// must carry a `[defaults]` section with type-independent entries.
pub fn parse_builtin(text: &str) -> Result<ConfigurationStore> {
    let store = parse_key_file(text).map_err(|e| {
        error!("Failed to parse built-in mount options: {}", e);
        match e {
            MountOptionsError::NoSections => {
                MountOptionsError::ConfigParse("No sections found.".to_string())
            }
            other => other,
        }
    })?;

    let has_any_defaults = store
        .any_device()
        .is_some_and(|options| options.contains_key(&TypeScope::Any));
    if !has_any_defaults {
        error!("Failed to parse built-in mount options: No global `defaults` section found.");
        return Err(MountOptionsError::ConfigParse(
            "No global `defaults` section found.".to_string(),
        ));
    }

    Ok(store)
}
