//! # Mediation Decisions

use qk_01_capability_tokens::{CapabilitySet, TokenError, TokenId};
use serde::{Deserialize, Serialize};
use shared_types::TenantId;
use std::fmt;

/// Machine-readable outcome of a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    Granted,
    /// Operation is not in the requirement table and strict mode is on.
    UnmappedOperation,
    /// Token is valid but lacks part of the required set.
    MissingCapabilities,
    TokenRevoked,
    TokenExpired,
    UseLimitExceeded,
    InvalidSignature,
    UnknownToken,
    /// A verifying token escaped its registered parent. Never expected.
    LineageViolation,
    MalformedToken,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::UnmappedOperation => "unmapped_operation",
            Self::MissingCapabilities => "missing_capabilities",
            Self::TokenRevoked => "token_revoked",
            Self::TokenExpired => "token_expired",
            Self::UseLimitExceeded => "use_limit_exceeded",
            Self::InvalidSignature => "invalid_signature",
            Self::UnknownToken => "unknown_token",
            Self::LineageViolation => "lineage_violation",
            Self::MalformedToken => "malformed_token",
        }
    }

    /// Reason for a token that failed verification or consumption.
    pub fn from_token_error(err: &TokenError) -> Self {
        match err {
            TokenError::Revoked => Self::TokenRevoked,
            TokenError::Expired { .. } => Self::TokenExpired,
            TokenError::UseLimitExceeded { .. } => Self::UseLimitExceeded,
            TokenError::InvalidSignature => Self::InvalidSignature,
            TokenError::UnknownToken => Self::UnknownToken,
            TokenError::LineageViolation => Self::LineageViolation,
            TokenError::EmptyCapabilitySet
            | TokenError::NotASubset { .. }
            | TokenError::DelegationTooDeep { .. }
            | TokenError::Malformed(_)
            | TokenError::Key(_) => Self::MalformedToken,
        }
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::LineageViolation)
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one `check_capability` call.
///
/// `missing` is only computed once the token has verified; a token
/// rejected earlier reports an empty `missing` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    pub operation: String,
    pub required: CapabilitySet,
    pub missing: CapabilitySet,
    pub reason: DecisionReason,
    pub timestamp: u64,
    pub token_id: TokenId,
    pub tenant_id: TenantId,
}

impl Decision {
    pub fn is_denied(&self) -> bool {
        !self.allowed
    }
}
