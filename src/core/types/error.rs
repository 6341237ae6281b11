//! Error types for RTTI scanning

use std::fmt;
use thiserror::Error;

/// Main error type for scan operations
#[derive(Error, Debug)]
pub enum RttiError {
    #[error("Malformed address: {0}")]
    MalformedAddress(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to read {size} bytes at {address}: {reason}")]
    ReadFault {
        address: String,
        size: usize,
        reason: String,
    },

    #[error("No recognizable type information: {0}")]
    UnknownStructure(String),

    #[error("Corrupt class hierarchy: {field} = {value}")]
    CorruptHierarchy { field: &'static str, value: u64 },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("RTTI parser is not bound to a session")]
    ParserUnbound,

    #[error("RTTI parser already bound to {bound}, cannot rebind to {requested}")]
    AlreadyBound { bound: String, requested: String },

    #[error("Scan task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Hex decoding error: {0}")]
    HexError(#[from] hex::FromHexError),
}

/// Result type alias for scan operations
pub type RttiResult<T> = Result<T, RttiError>;

impl RttiError {
    /// Creates a read fault error
    pub fn read_fault(address: impl fmt::Display, size: usize, reason: impl Into<String>) -> Self {
        RttiError::ReadFault {
            address: address.to_string(),
            size,
            reason: reason.into(),
        }
    }

    /// Creates an unknown structure error
    pub fn unknown(reason: impl Into<String>) -> Self {
        RttiError::UnknownStructure(reason.into())
    }

    /// Creates a corrupt hierarchy error
    pub fn corrupt(field: &'static str, value: u64) -> Self {
        RttiError::CorruptHierarchy { field, value }
    }

    /// Whether the error came from the memory backend rather than decoding
    pub fn is_read_fault(&self) -> bool {
        matches!(self, RttiError::ReadFault { .. })
    }
}
