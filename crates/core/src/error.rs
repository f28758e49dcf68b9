//! Error types for the page store
//!
//! Every fallible operation returns [`Result`]. Errors fall into the
//! categories reported by [`Error::category`]; soft signals that still carry
//! usable data (recovered reads, foreign format versions) are reported through
//! [`LoadStatus`](crate::types::LoadStatus) on the success path instead.

use crate::settings::SettingsError;
use crate::types::Role;
use std::io;
use thiserror::Error;

/// Result type alias for page store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by an adapter primitive.
#[derive(Debug, Error)]
pub enum AdapterFault {
    /// Host I/O failure (file-backed drivers)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The device or driver rejected the request
    #[error("Device fault: {0}")]
    Device(String),
}

impl AdapterFault {
    /// Create a device fault
    pub fn device(detail: impl Into<String>) -> Self {
        AdapterFault::Device(detail.into())
    }
}

/// Error types for the page store
#[derive(Debug, Error)]
pub enum Error {
    /// A required buffer or handle was not supplied
    #[error("Missing required {0}")]
    Pointer(&'static str),

    /// Argument outside its valid range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Settings or options rejected at init
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    /// Operation attempted before a successful init
    #[error("Page store is not initialized")]
    NotInitialized,

    /// Context invariants no longer hold
    #[error("Context integrity check failed: {0}")]
    CorruptedContext(&'static str),

    /// Erase kept failing
    #[error("Erase of page {page} failed after {attempts} attempts: {source}")]
    Erase {
        /// Physical page
        page: u32,
        /// Attempts made
        attempts: u32,
        /// Fault reported on the final attempt
        #[source]
        source: AdapterFault,
    },

    /// Program kept failing
    #[error("Write of page {page} failed after {attempts} attempts: {source}")]
    Write {
        /// Physical page
        page: u32,
        /// Attempts made
        attempts: u32,
        /// Fault reported on the final attempt
        #[source]
        source: AdapterFault,
    },

    /// Read kept failing
    #[error("Read of page {page} failed after {attempts} attempts: {source}")]
    Read {
        /// Physical page
        page: u32,
        /// Attempts made
        attempts: u32,
        /// Fault reported on the final attempt
        #[source]
        source: AdapterFault,
    },

    /// Checksum primitive failed (never retried)
    #[error("Checksum computation failed: {0}")]
    Checksum(#[source] AdapterFault),

    /// Every commit attempt read back different bytes than were written
    #[error("Read-back of page {page} did not match the written image after {attempts} attempts")]
    WriteVerifyMismatch {
        /// Physical page
        page: u32,
        /// Attempts made
        attempts: u32,
    },

    /// Neither the primary nor the fallback copy is usable
    #[error("No valid copy of {role} record {index}")]
    UnrecoverableData {
        /// Role that was requested
        role: Role,
        /// Logical index that was requested
        index: u32,
    },
}

/// Coarse classification of an [`Error`], telling the caller how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller bug: bad argument, missing buffer, not initialized
    Contract,
    /// The long-lived context was found inconsistent
    Integrity,
    /// Adapter primitive failed after the retry budget
    Hardware,
    /// Both copies of a record are lost
    Data,
    /// The effect happened but should be acted on (e.g. verify mismatch)
    Soft,
}

impl Error {
    /// Create an invalid-parameter error
    pub fn invalid_parameter(detail: impl Into<String>) -> Self {
        Error::InvalidParameter(detail.into())
    }

    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Pointer(_)
            | Error::InvalidParameter(_)
            | Error::InvalidSettings(_)
            | Error::NotInitialized => ErrorCategory::Contract,
            Error::CorruptedContext(_) => ErrorCategory::Integrity,
            Error::Erase { .. } | Error::Write { .. } | Error::Read { .. } | Error::Checksum(_) => {
                ErrorCategory::Hardware
            }
            Error::UnrecoverableData { .. } => ErrorCategory::Data,
            Error::WriteVerifyMismatch { .. } => ErrorCategory::Soft,
        }
    }

    /// Physical page an I/O error refers to, if any
    pub fn page(&self) -> Option<u32> {
        match self {
            Error::Erase { page, .. }
            | Error::Write { page, .. }
            | Error::Read { page, .. }
            | Error::WriteVerifyMismatch { page, .. } => Some(*page),
            _ => None,
        }
    }
}
