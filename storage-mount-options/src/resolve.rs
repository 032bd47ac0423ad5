// SPDX-License-Identifier: GPL-3.0-only

//! Option resolution
//!
//! Folds the configuration layers, lowest precedence first, into a working
//! pair of option sets: one for the requested filesystem type and one for
//! "any" type. Every layer overrides field by field. The pair is finally
//! collapsed into a single effective set.

use tracing::info;

use crate::device::DeviceIdentity;
use crate::model::{
    ConfigurationStore, FilesystemOptionSet, TypeOptions, TypeScope, additive_merge,
    override_merge,
};

/// One configuration source in precedence order
#[derive(Debug, Clone, Copy)]
pub enum Layer<'a> {
    /// Compiled-in policy, the baseline
    Builtin(&'a ConfigurationStore),
    /// Administrator `mount_options.conf`
    Global(&'a ConfigurationStore),
    /// Device-reported hints, no device dimension
    Hints(&'a TypeOptions),
}

impl Layer<'_> {
    fn is_override(&self) -> bool {
        !matches!(self, Layer::Builtin(_))
    }
}

/// Working state threaded through the layers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingPair {
    pub for_type: FilesystemOptionSet,
    pub any: FilesystemOptionSet,
    /// Whether a non-builtin layer replaced any field
    pub overridden: bool,
}

impl WorkingPair {
    /// Apply one type-keyed block on top of the pair.
    fn apply_options(self, options: &TypeOptions, fs_type: Option<&TypeScope>) -> (Self, bool) {
        let (any, any_changed) = override_merge(options.get(&TypeScope::Any), self.any);
        let (for_type, type_changed) =
            override_merge(fs_type.and_then(|t| options.get(t)), self.for_type);

        let pair = WorkingPair {
            for_type,
            any,
            overridden: self.overridden,
        };
        (pair, any_changed || type_changed)
    }

    /// Apply the any-device block, then the first block matching `device`.
    fn apply_store(
        self,
        store: &ConfigurationStore,
        device: Option<&dyn DeviceIdentity>,
        fs_type: Option<&TypeScope>,
    ) -> (Self, bool) {
        let mut pair = self;
        let mut changed = false;

        if let Some(general) = store.any_device() {
            let (next, c) = pair.apply_options(general, fs_type);
            pair = next;
            changed |= c;
        }

        let device_block =
            device.and_then(|d| store.matching_device(d.device_path(), d.symlinks()));
        if let Some(block) = device_block {
            let (next, c) = pair.apply_options(block, fs_type);
            pair = next;
            changed |= c;
        }

        (pair, changed)
    }

    pub fn apply(
        self,
        layer: &Layer<'_>,
        device: Option<&dyn DeviceIdentity>,
        fs_type: Option<&TypeScope>,
    ) -> Self {
        let (mut pair, changed) = match layer {
            Layer::Builtin(store) | Layer::Global(store) => {
                self.apply_store(store, device, fs_type)
            }
            Layer::Hints(options) => self.apply_options(options, fs_type),
        };
        pair.overridden |= changed && layer.is_override();
        pair
    }

    /// Merge the "any" set into the type-specific set.
    pub fn finish(self) -> FilesystemOptionSet {
        let effective = additive_merge(Some(&self.any), self.for_type);

        if self.overridden && !effective.defaults().is_empty() {
            info!(
                "Using overridden mount options: {}",
                effective.defaults().join(",")
            );
        }

        effective
    }
}

/// Resolve the effective option set for `fs_type` on `device`.
///
/// `layers` must be ordered lowest precedence first.
pub fn resolve(
    layers: &[Layer<'_>],
    device: Option<&dyn DeviceIdentity>,
    fs_type: Option<&str>,
) -> FilesystemOptionSet {
    let fs_type = fs_type.map(TypeScope::filesystem);

    layers
        .iter()
        .fold(WorkingPair::default(), |pair, layer| {
            pair.apply(layer, device, fs_type.as_ref())
        })
        .finish()
}
