//! Unified error type for the kernel runtime.

use kernel_telemetry::TelemetryError;
use qk_01_capability_tokens::TokenError;
use qk_02_audit_log::AuditError;
use qk_03_capability_mediator::MediationError;
use qk_04_qubit_allocator::AllocationError;
use thiserror::Error;

use crate::container::ConfigError;

/// Any failure surfaced by [`crate::SecurityKernel`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("mediation error: {0}")]
    Mediation(#[from] MediationError),

    #[error("allocation error: {0}")]
    Allocation(#[from] AllocationError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

impl KernelError {
    /// True for errors that indicate an attack or a broken invariant rather
    /// than a routine refusal.
    pub fn is_security_relevant(&self) -> bool {
        match self {
            Self::Token(e) => e.is_security_violation(),
            Self::Mediation(MediationError::InvariantViolation { .. }) => true,
            Self::Allocation(e) => e.is_security_relevant(),
            _ => false,
        }
    }
}

pub type KernelResult<T> = Result<T, KernelError>;
