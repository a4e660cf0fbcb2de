//! # Capability Mediator Service
//!
//! Complete mediation: every protected operation is checked against the
//! requirement table and the presented token, and every outcome is
//! counted, kept in a bounded history and handed to the auditor before the
//! caller sees it.

use parking_lot::Mutex;
use qk_01_capability_tokens::{CapabilitySet, CapabilityToken};
use shared_types::{SystemTimeSource, TimeSource};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::domain::{
    Decision, DecisionReason, MediationError, MediationResult, MediatorConfig,
    MediatorStatistics, StaticRequirementTable,
};
use crate::ports::{CapabilityMediatorApi, DecisionAuditor, OperationRequirements, TokenAuthority};

#[derive(Default)]
struct MediatorState {
    statistics: MediatorStatistics,
    history: VecDeque<Decision>,
}

/// Capability mediator.
///
/// Knows nothing about qubits; hardware ownership is the allocator's job.
pub struct CapabilityMediator {
    config: MediatorConfig,
    requirements: Arc<dyn OperationRequirements>,
    tokens: Arc<dyn TokenAuthority>,
    auditor: Arc<dyn DecisionAuditor>,
    time: Arc<dyn TimeSource>,
    state: Mutex<MediatorState>,
}

impl CapabilityMediator {
    /// Mediator over the standard requirement table and the system clock.
    pub fn new(
        config: MediatorConfig,
        tokens: Arc<dyn TokenAuthority>,
        auditor: Arc<dyn DecisionAuditor>,
    ) -> Self {
        Self::with_dependencies(
            config,
            Arc::new(StaticRequirementTable::standard()),
            tokens,
            auditor,
            Arc::new(SystemTimeSource),
        )
    }

    pub fn with_dependencies(
        config: MediatorConfig,
        requirements: Arc<dyn OperationRequirements>,
        tokens: Arc<dyn TokenAuthority>,
        auditor: Arc<dyn DecisionAuditor>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            config,
            requirements,
            tokens,
            auditor,
            time,
            state: Mutex::new(MediatorState::default()),
        }
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    fn decide(
        &self,
        token: &CapabilityToken,
        operation: &str,
    ) -> (DecisionReason, CapabilitySet, CapabilitySet) {
        let required = match self.requirements.required_capabilities(operation) {
            Some(required) => required,
            None if self.config.strict_mode => {
                return (
                    DecisionReason::UnmappedOperation,
                    CapabilitySet::new(),
                    CapabilitySet::new(),
                );
            }
            None => CapabilitySet::new(),
        };

        if let Err(e) = self.tokens.check(token) {
            return (
                DecisionReason::from_token_error(&e),
                required,
                CapabilitySet::new(),
            );
        }

        let missing = required.difference(token.capabilities());
        if !missing.is_empty() {
            return (DecisionReason::MissingCapabilities, required, missing);
        }

        // Consumption re-verifies under the manager's lock; a use lost to a
        // concurrent caller surfaces here.
        if let Err(e) = self.tokens.consume(token) {
            return (
                DecisionReason::from_token_error(&e),
                required,
                CapabilitySet::new(),
            );
        }

        (DecisionReason::Granted, required, missing)
    }

    fn record(&self, decision: &Decision) {
        {
            let mut state = self.state.lock();
            let stats = &mut state.statistics;
            stats.checks_performed += 1;
            if decision.allowed {
                stats.allowed += 1;
            } else {
                stats.denied += 1;
                *stats
                    .denials_by_reason
                    .entry(decision.reason.as_str().to_string())
                    .or_default() += 1;
            }

            if self.config.max_decision_history > 0 {
                if state.history.len() == self.config.max_decision_history {
                    state.history.pop_front();
                }
                state.history.push_back(decision.clone());
            }
        }

        if decision.allowed {
            debug!(
                tenant_id = %decision.tenant_id,
                token_id = %decision.token_id,
                operation = %decision.operation,
                "Capability granted"
            );
        } else if decision.reason.is_invariant_violation() {
            error!(
                tenant_id = %decision.tenant_id,
                token_id = %decision.token_id,
                operation = %decision.operation,
                reason = %decision.reason,
                "Security invariant violated during mediation"
            );
        } else {
            warn!(
                tenant_id = %decision.tenant_id,
                token_id = %decision.token_id,
                operation = %decision.operation,
                reason = %decision.reason,
                missing = %decision.missing,
                "Capability denied"
            );
        }

        self.auditor.record_decision(decision);
    }
}

impl CapabilityMediatorApi for CapabilityMediator {
    fn check_capability(&self, token: &CapabilityToken, operation: &str) -> Decision {
        let (reason, required, missing) = self.decide(token, operation);

        let decision = Decision {
            allowed: reason == DecisionReason::Granted,
            operation: operation.to_string(),
            required,
            missing,
            reason,
            timestamp: self.time.now(),
            token_id: token.token_id(),
            tenant_id: token.tenant_id().clone(),
        };
        self.record(&decision);
        decision
    }

    fn require_capability(
        &self,
        token: &CapabilityToken,
        operation: &str,
    ) -> MediationResult<Decision> {
        let decision = self.check_capability(token, operation);
        if decision.allowed {
            Ok(decision)
        } else {
            Err(MediationError::from_denial(&decision))
        }
    }

    fn required_capabilities(&self, operation: &str) -> Option<CapabilitySet> {
        self.requirements.required_capabilities(operation)
    }

    fn statistics(&self) -> MediatorStatistics {
        self.state.lock().statistics.clone()
    }

    fn recent_decisions(&self, limit: usize) -> Vec<Decision> {
        let state = self.state.lock();
        let skip = state.history.len().saturating_sub(limit);
        state.history.iter().skip(skip).cloned().collect()
    }
}
