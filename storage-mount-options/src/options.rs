// SPDX-License-Identifier: GPL-3.0-only

//! Mount option string tokenizer
//!
//! Splits `name[=value],...` strings the way libmount does:
//! - empty items (leading, trailing or doubled commas) are skipped
//! - a double quote suspends `,` and `=` recognition until the closing quote
//! - a comma preceded by a backslash does not end the item
//! - the first unquoted `=` separates name and value; the rest belongs to the value
//! - nothing is trimmed
//!
//! A value-less option and an option with an empty value are different
//! things (`ro` vs `ro=`), which [`OptionValue`] keeps apart.

use std::fmt;

use crate::error::{MountOptionsError, Result};

/// Value part of a mount option
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OptionValue {
    /// `name` on its own
    Flag,
    /// `name=value`, value possibly empty
    Value(String),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Flag => None,
            OptionValue::Value(value) => Some(value),
        }
    }

    /// A present, non-empty value
    pub fn non_empty(&self) -> Option<&str> {
        self.as_str().filter(|value| !value.is_empty())
    }
}

/// One `(name, value)` item of an option string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountOption {
    pub name: String,
    pub value: OptionValue,
}

impl MountOption {
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: OptionValue::Flag,
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: OptionValue::Value(value.into()),
        }
    }

    /// Split a single stored option specification (`name` or `name=value`).
    ///
    /// Unlike [`tokenize`] this never fails; specifications come from
    /// already-tokenized configuration.
    pub fn from_spec(spec: &str) -> Self {
        match spec.split_once('=') {
            Some((name, value)) => Self::with_value(name, value),
            None => Self::flag(spec),
        }
    }
}

impl fmt::Display for MountOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            OptionValue::Flag => write!(f, "{}", self.name),
            OptionValue::Value(value) => write!(f, "{}={}", self.name, value),
        }
    }
}

/// Tokenize a comma separated mount option string.
///
/// Fails on an unterminated quote or an item with an empty name; the
/// reported offset is the byte offset where the offending item starts.
pub fn tokenize(input: &str) -> Result<Vec<MountOption>> {
    let bytes = input.as_bytes();
    let mut options = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == b',' {
            pos += 1;
            continue;
        }

        let start = pos;
        let mut in_quote = false;
        let mut separator = None;

        while pos < bytes.len() {
            match bytes[pos] {
                b'"' => in_quote = !in_quote,
                b',' if !in_quote && bytes[pos - 1] != b'\\' => break,
                b'=' if !in_quote && separator.is_none() => separator = Some(pos),
                _ => {}
            }
            pos += 1;
        }

        let malformed = || MountOptionsError::MalformedOptions {
            options: input.to_string(),
            offset: start,
        };

        if in_quote {
            return Err(malformed());
        }

        let option = match separator {
            Some(sep) => MountOption::with_value(&input[start..sep], &input[sep + 1..pos]),
            None => MountOption::flag(&input[start..pos]),
        };
        if option.name.is_empty() {
            return Err(malformed());
        }

        options.push(option);
    }

    Ok(options)
}

/// Join options back into a comma separated string.
pub fn join(options: &[MountOption]) -> String {
    options
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
