//! # Inbound Ports (Driving Ports)
//!
//! Public API exposed by the Capability Mediator subsystem.

use qk_01_capability_tokens::{CapabilitySet, CapabilityToken};

use crate::domain::{Decision, MediationResult, MediatorStatistics};

/// Primary API for the Capability Mediator subsystem.
pub trait CapabilityMediatorApi: Send + Sync {
    /// Decides whether `token` may perform `operation`.
    ///
    /// ## Order
    ///
    /// 1. Unmapped operation in strict mode: deny
    /// 2. Token fails verification: deny, nothing else computed
    /// 3. `missing = required - token.capability_set` non-empty: deny
    /// 4. Consume one use and allow
    ///
    /// Every decision is audited before it is returned.
    fn check_capability(&self, token: &CapabilityToken, operation: &str) -> Decision;

    /// [`CapabilityMediatorApi::check_capability`] that turns a denial into
    /// an error.
    fn require_capability(
        &self,
        token: &CapabilityToken,
        operation: &str,
    ) -> MediationResult<Decision>;

    fn required_capabilities(&self, operation: &str) -> Option<CapabilitySet>;

    fn is_operation_mapped(&self, operation: &str) -> bool {
        self.required_capabilities(operation).is_some()
    }

    fn statistics(&self) -> MediatorStatistics;

    /// Most recent decisions, oldest first.
    fn recent_decisions(&self, limit: usize) -> Vec<Decision>;
}
