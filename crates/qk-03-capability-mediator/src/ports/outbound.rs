//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the mediator needs from the rest of the kernel.

use qk_01_capability_tokens::{CapabilitySet, CapabilityToken, TokenResult};

use crate::domain::Decision;

/// Source of the operation → required capability mapping.
pub trait OperationRequirements: Send + Sync {
    /// `None` when the operation is not mapped.
    fn required_capabilities(&self, operation: &str) -> Option<CapabilitySet>;
}

/// Verifies and consumes tokens.
pub trait TokenAuthority: Send + Sync {
    /// Full verification without side effects.
    fn check(&self, token: &CapabilityToken) -> TokenResult<()>;

    /// Re-verify and record one use atomically.
    fn consume(&self, token: &CapabilityToken) -> TokenResult<u32>;
}

/// Receives every decision, allowed or denied, before it is returned.
pub trait DecisionAuditor: Send + Sync {
    fn record_decision(&self, decision: &Decision);
}
