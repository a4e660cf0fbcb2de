//! # Domain Errors
//!
//! Error types for the Audit Log subsystem.

use thiserror::Error;

/// Errors that can occur when reading or extending the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    /// Requested entry does not exist.
    #[error("entry {index} out of range (log has {len} entries)")]
    IndexOutOfRange { index: u64, len: u64 },

    /// Operation needs at least one entry.
    #[error("audit log is empty")]
    EmptyLog,

    /// Range bounds are reversed, empty or past the end.
    #[error("invalid range {start}..{end} (log has {len} entries)")]
    InvalidRange { start: u64, end: u64, len: u64 },

    /// Record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
