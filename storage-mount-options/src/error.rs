// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Why an option was refused by the assembler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The option name itself contains a comma
    Malformed,
    /// The option is not on any allow list for this caller
    NotAllowed,
}

/// Errors raised while resolving or validating mount options
#[derive(Debug, Error)]
pub enum MountOptionsError {
    #[error("Failed to parse mount options: {0}")]
    ConfigParse(String),

    #[error("Failed to parse mount options: No sections found.")]
    NoSections,

    #[error("'device' is not a valid block device: {0}")]
    DeviceUnavailable(String),

    #[error("Malformed mount options string '{options}' at position {offset}")]
    MalformedOptions { options: String, offset: usize },

    #[error("{}", rejection_message(.option, .reason))]
    OptionNotPermitted { option: String, reason: Rejection },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn rejection_message(option: &str, reason: &Rejection) -> String {
    match reason {
        Rejection::Malformed => format!("Malformed mount option `{option}'"),
        Rejection::NotAllowed => format!("Mount option `{option}' is not allowed"),
    }
}

impl MountOptionsError {
    pub fn is_not_permitted(&self) -> bool {
        matches!(self, MountOptionsError::OptionNotPermitted { .. })
    }
}

pub type Result<T> = std::result::Result<T, MountOptionsError>;
