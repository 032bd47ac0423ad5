// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Error types for system-level operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("invalid udev database line: {0}")]
    InvalidUdevLine(String),
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;
