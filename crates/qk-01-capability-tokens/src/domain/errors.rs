//! # Domain Errors
//!
//! Error types for the Capability Token subsystem.
//!
//! Two families share one enum:
//! - **Validation** errors are construction-time rejections
//!   (`EmptyCapabilitySet`, `NotASubset`, `DelegationTooDeep`).
//! - **Denials** are the outcome of a failed verification and carry a
//!   machine-readable [`TokenError::reason_code`].

use shared_types::KeyError;
use thiserror::Error;

use super::capability::CapabilitySet;

/// Errors that can occur during token issuance or verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// A token must grant at least one capability.
    #[error("capability set must not be empty")]
    EmptyCapabilitySet,

    /// Attenuation or delegation asked for capabilities the source lacks.
    #[error("requested capabilities exceed the source token: {excess}")]
    NotASubset { excess: CapabilitySet },

    /// The delegation chain would grow past the configured bound.
    #[error("delegation depth {depth} exceeds maximum {max}")]
    DelegationTooDeep { depth: u32, max: u32 },

    /// Token id is in the revocation set.
    #[error("token revoked")]
    Revoked,

    /// Current time is past `expires_at`.
    #[error("token expired at {expires_at}")]
    Expired { expires_at: u64 },

    /// `use_count` has reached `max_uses`.
    #[error("use limit of {max_uses} reached")]
    UseLimitExceeded { max_uses: u32 },

    /// Recomputed MAC does not match.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Validly shaped token that this manager never issued (or already
    /// garbage-collected).
    #[error("token not issued by this manager")]
    UnknownToken,

    /// A verifying token is not contained in its registered parent.
    #[error("delegation lineage violated")]
    LineageViolation,

    /// Field map could not be decoded into a token.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Key material could not be used.
    #[error("key error: {0}")]
    Key(#[from] KeyError),
}

impl TokenError {
    /// True for construction-time rejections that are never coerced.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyCapabilitySet | Self::NotASubset { .. } | Self::DelegationTooDeep { .. }
        )
    }

    /// True for internal invariant violations that should be structurally
    /// impossible.
    pub fn is_security_violation(&self) -> bool {
        matches!(self, Self::LineageViolation)
    }

    /// Stable, machine-readable reason code.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::EmptyCapabilitySet => "empty_capability_set",
            Self::NotASubset { .. } => "not_a_subset",
            Self::DelegationTooDeep { .. } => "delegation_too_deep",
            Self::Revoked => "token_revoked",
            Self::Expired { .. } => "token_expired",
            Self::UseLimitExceeded { .. } => "use_limit_exceeded",
            Self::InvalidSignature => "invalid_signature",
            Self::UnknownToken => "unknown_token",
            Self::LineageViolation => "lineage_violation",
            Self::Malformed(_) => "malformed_token",
            Self::Key(_) => "key_error",
        }
    }
}

/// Result alias for token operations.
pub type TokenResult<T> = Result<T, TokenError>;
