//! [`DecisionAuditor`] implementations.

use qk_02_audit_log::{details, AuditEventType, AuditLogApi};
use std::sync::Arc;
use tracing::error;

use crate::domain::Decision;
use crate::ports::DecisionAuditor;

/// Writes each decision to the tamper-evident audit log.
///
/// Allowed decisions become `capability_granted`, denials
/// `capability_denied`, and invariant violations `security_violation`.
pub struct AuditLogDecisionAuditor {
    log: Arc<dyn AuditLogApi>,
}

impl AuditLogDecisionAuditor {
    pub fn new(log: Arc<dyn AuditLogApi>) -> Self {
        Self { log }
    }
}

impl DecisionAuditor for AuditLogDecisionAuditor {
    fn record_decision(&self, decision: &Decision) {
        let event_type = if decision.allowed {
            AuditEventType::CapabilityGranted
        } else if decision.reason.is_invariant_violation() {
            AuditEventType::SecurityViolation
        } else {
            AuditEventType::CapabilityDenied
        };

        let entry = details([
            ("operation", decision.operation.clone()),
            ("reason", decision.reason.as_str().to_string()),
            ("required", decision.required.to_string()),
            ("missing", decision.missing.to_string()),
            ("token_id", decision.token_id.to_string()),
        ]);

        if let Err(e) = self
            .log
            .append(event_type, Some(&decision.tenant_id), entry)
        {
            error!(
                operation = %decision.operation,
                error = %e,
                "Failed to append decision to audit log"
            );
        }
    }
}

/// Discards decisions. For mediators whose history and counters are the
/// only record needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDecisionAuditor;

impl DecisionAuditor for NullDecisionAuditor {
    fn record_decision(&self, _decision: &Decision) {}
}
