//! # Domain Errors
//!
//! Error types for the Capability Mediator subsystem.

use qk_01_capability_tokens::CapabilitySet;
use thiserror::Error;

use super::decision::{Decision, DecisionReason};

/// Errors raised by the fail-fast mediation wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediationError {
    /// The operation was denied. Carries the machine-readable reason and
    /// the exact capabilities the token lacked.
    #[error("operation '{operation}' denied: {reason} (missing: [{missing}])")]
    SecurityError {
        operation: String,
        reason: DecisionReason,
        missing: CapabilitySet,
    },

    /// A structural invariant was found broken during mediation.
    #[error("invariant violated during '{operation}': {reason}")]
    InvariantViolation {
        operation: String,
        reason: DecisionReason,
    },
}

impl MediationError {
    /// Error for a denied decision.
    pub fn from_denial(decision: &Decision) -> Self {
        if decision.reason.is_invariant_violation() {
            Self::InvariantViolation {
                operation: decision.operation.clone(),
                reason: decision.reason,
            }
        } else {
            Self::SecurityError {
                operation: decision.operation.clone(),
                reason: decision.reason,
                missing: decision.missing.clone(),
            }
        }
    }

    pub fn reason(&self) -> DecisionReason {
        match self {
            Self::SecurityError { reason, .. } | Self::InvariantViolation { reason, .. } => *reason,
        }
    }
}

/// Result alias for mediation operations.
pub type MediationResult<T> = Result<T, MediationError>;
