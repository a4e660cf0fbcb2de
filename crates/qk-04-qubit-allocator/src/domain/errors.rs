//! # Domain Errors
//!
//! Error types for the Qubit Allocator subsystem.

use shared_types::{QubitId, TenantId};
use thiserror::Error;

use super::qubit::QubitState;

/// Errors that can occur during allocation and lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// The request would take the tenant past its quota.
    #[error("tenant {tenant_id} quota exceeded: {allocated} + {requested} > {max}")]
    QuotaExceeded {
        tenant_id: TenantId,
        requested: u32,
        allocated: u32,
        max: u32,
    },

    /// Not enough free qubits pool-wide. Retryable by the caller.
    #[error("resource exhausted: requested {requested}, {available} free")]
    ResourceExhausted { requested: u32, available: u32 },

    /// The tenant does not own every listed qubit.
    #[error("tenant {tenant_id} does not own qubits {qubit_ids:?}")]
    OwnershipError {
        tenant_id: TenantId,
        qubit_ids: Vec<QubitId>,
    },

    #[error("unknown qubit {0}")]
    UnknownQubit(QubitId),

    #[error("qubit {qubit_id} cannot go from {from} to {to}")]
    InvalidTransition {
        qubit_id: QubitId,
        from: QubitState,
        to: QubitState,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AllocationError {
    /// Ownership failures are audited like capability denials.
    pub fn is_security_relevant(&self) -> bool {
        matches!(self, Self::OwnershipError { .. })
    }

    /// Callers may retry with backoff; the allocator never retries itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ResourceExhausted { .. })
    }

    /// Stable label for metrics and audit details.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::ResourceExhausted { .. } => "resource_exhausted",
            Self::OwnershipError { .. } => "ownership",
            Self::UnknownQubit(_) => "unknown_qubit",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Result alias for allocator operations.
pub type AllocationResult<T> = Result<T, AllocationError>;
