// SPDX-License-Identifier: GPL-3.0-only

//! Configuration store model
//!
//! A [`ConfigurationStore`] maps device scopes to per-filesystem-type
//! [`FilesystemOptionSet`]s. Sets are merged either additively (union of the
//! string lists) or by override (a present field replaces the whole field).

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Section name and bare-key marker meaning "regardless of device / type"
pub const ANY_MARKER: &str = "defaults";

/// One of the four lists an option set carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionField {
    Defaults,
    Allow,
    AllowUidSelf,
    AllowGidSelf,
}

impl OptionField {
    pub const ALL: [OptionField; 4] = [
        OptionField::Defaults,
        OptionField::Allow,
        OptionField::AllowUidSelf,
        OptionField::AllowGidSelf,
    ];

    pub fn key(self) -> &'static str {
        match self {
            OptionField::Defaults => "defaults",
            OptionField::Allow => "allow",
            OptionField::AllowUidSelf => "allow_uid_self",
            OptionField::AllowGidSelf => "allow_gid_self",
        }
    }
}

/// Which filesystem types an option set applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeScope {
    Any,
    /// Lower-cased filesystem type
    Filesystem(String),
}

impl TypeScope {
    pub fn filesystem(fs_type: &str) -> Self {
        TypeScope::Filesystem(fs_type.to_ascii_lowercase())
    }
}

impl fmt::Display for TypeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeScope::Any => f.write_str(ANY_MARKER),
            TypeScope::Filesystem(fs_type) => f.write_str(fs_type),
        }
    }
}

/// Which devices a block of option sets applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceScope {
    Any,
    /// Device node or one of its symlinks, matched verbatim
    Device(String),
}

impl DeviceScope {
    pub fn from_section(name: &str) -> Self {
        if name == ANY_MARKER {
            DeviceScope::Any
        } else {
            DeviceScope::Device(name.to_string())
        }
    }
}

/// Mount option lists for one filesystem type.
///
/// Every field is optional: an absent field is left alone by an override,
/// while a present but empty field resets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilesystemOptionSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_uid_self: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_gid_self: Option<Vec<String>>,
}

impl FilesystemOptionSet {
    pub fn field(&self, field: OptionField) -> Option<&[String]> {
        match field {
            OptionField::Defaults => self.defaults.as_deref(),
            OptionField::Allow => self.allow.as_deref(),
            OptionField::AllowUidSelf => self.allow_uid_self.as_deref(),
            OptionField::AllowGidSelf => self.allow_gid_self.as_deref(),
        }
    }

    fn field_mut(&mut self, field: OptionField) -> &mut Option<Vec<String>> {
        match field {
            OptionField::Defaults => &mut self.defaults,
            OptionField::Allow => &mut self.allow,
            OptionField::AllowUidSelf => &mut self.allow_uid_self,
            OptionField::AllowGidSelf => &mut self.allow_gid_self,
        }
    }

    /// Replace `field`, returning the previous value.
    pub fn set_field(&mut self, field: OptionField, values: Vec<String>) -> Option<Vec<String>> {
        self.field_mut(field).replace(values)
    }

    pub fn with_field<S: Into<String>>(
        mut self,
        field: OptionField,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.set_field(field, values.into_iter().map(Into::into).collect());
        self
    }

    /// Configured defaults, empty when unset
    pub fn defaults(&self) -> &[String] {
        self.defaults.as_deref().unwrap_or_default()
    }

    pub fn contains(&self, field: OptionField, value: &str) -> bool {
        self.field(field)
            .is_some_and(|values| values.iter().any(|v| v == value))
    }
}

/// Append the elements of `src` missing from `dst`, field by field.
///
/// Existing order in `dst` is kept and new elements follow in `src` order.
/// An absent or empty source field leaves `dst` untouched.
pub fn additive_merge(
    src: Option<&FilesystemOptionSet>,
    mut dst: FilesystemOptionSet,
) -> FilesystemOptionSet {
    let Some(src) = src else {
        return dst;
    };

    for field in OptionField::ALL {
        let Some(incoming) = src.field(field).filter(|values| !values.is_empty()) else {
            continue;
        };

        let merged = dst.field_mut(field).get_or_insert_with(Vec::new);
        for value in incoming {
            if !merged.contains(value) {
                merged.push(value.clone());
            }
        }
    }

    dst
}

/// Replace each field of `dst` that is present in `src`.
///
/// Returns the new set and whether any field was replaced.
pub fn override_merge(
    src: Option<&FilesystemOptionSet>,
    mut dst: FilesystemOptionSet,
) -> (FilesystemOptionSet, bool) {
    let Some(src) = src else {
        return (dst, false);
    };

    let mut changed = false;
    for field in OptionField::ALL {
        if let Some(values) = src.field(field) {
            dst.set_field(field, values.to_vec());
            changed = true;
        }
    }

    (dst, changed)
}

/// Decode a configuration key into the type scope and field it targets.
///
/// `defaults`, `allow`, `allow_uid_self` and `allow_gid_self` apply to any
/// type; `<fstype>_<field>` applies to `fstype`, and a `defaults_` prefix is
/// the any-type marker again. The longest field suffix is tried first so
/// `vfat_allow_uid_self` is not read as `vfat_allow_uid` + `_self`. Unknown
/// keys yield `None`.
pub fn decode_key(key: &str) -> Option<(TypeScope, OptionField)> {
    if let Some(field) = OptionField::ALL.into_iter().find(|f| f.key() == key) {
        return Some((TypeScope::Any, field));
    }

    const SUFFIX_ORDER: [OptionField; 4] = [
        OptionField::AllowUidSelf,
        OptionField::AllowGidSelf,
        OptionField::Allow,
        OptionField::Defaults,
    ];

    SUFFIX_ORDER.into_iter().find_map(|field| {
        let prefix = key.strip_suffix(field.key())?.strip_suffix('_')?;
        match prefix {
            "" => None,
            ANY_MARKER => Some((TypeScope::Any, field)),
            fs_type => Some((TypeScope::filesystem(fs_type), field)),
        }
    })
}

/// Option sets keyed by filesystem type
pub type TypeOptions = BTreeMap<TypeScope, FilesystemOptionSet>;

/// One section of a configuration source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceBlock {
    pub scope: DeviceScope,
    pub options: TypeOptions,
}

/// Two-level configuration: device scope, then filesystem type.
///
/// Blocks keep the order they were read in; the first device block matching
/// a device wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationStore {
    blocks: Vec<DeviceBlock>,
}

impl ConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block, merging field-wise into an existing block of the same scope.
    pub fn insert(&mut self, scope: DeviceScope, options: TypeOptions) {
        match self.blocks.iter_mut().find(|block| block.scope == scope) {
            Some(block) => {
                for (type_scope, set) in options {
                    let existing = block.options.remove(&type_scope).unwrap_or_default();
                    let (merged, _) = override_merge(Some(&set), existing);
                    block.options.insert(type_scope, merged);
                }
            }
            None => self.blocks.push(DeviceBlock { scope, options }),
        }
    }

    /// The block applying to every device
    pub fn any_device(&self) -> Option<&TypeOptions> {
        self.block(&DeviceScope::Any)
    }

    pub fn block(&self, scope: &DeviceScope) -> Option<&TypeOptions> {
        self.blocks
            .iter()
            .find(|block| &block.scope == scope)
            .map(|block| &block.options)
    }

    /// First device block naming `device` or one of its `symlinks`
    pub fn matching_device(&self, device: &str, symlinks: &[String]) -> Option<&TypeOptions> {
        self.blocks
            .iter()
            .find(|block| match &block.scope {
                DeviceScope::Any => false,
                DeviceScope::Device(name) => name == device || symlinks.contains(name),
            })
            .map(|block| &block.options)
    }

    pub fn blocks(&self) -> &[DeviceBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
