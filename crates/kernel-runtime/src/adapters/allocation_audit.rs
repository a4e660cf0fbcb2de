//! Allocator events onto the tamper-evident audit log.

use qk_02_audit_log::{details, AuditEventType, AuditLogApi};
use qk_04_qubit_allocator::{AllocationAuditSink, AllocationEvent, QubitState};
use shared_types::QubitId;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::error;

/// Implements the allocator's outbound audit port over qk-02.
///
/// | Event | Audit type |
/// |-------|------------|
/// | `Allocated` | `qubit_allocated` |
/// | `Deallocated { reset: true }` | `qubit_deallocated` |
/// | `Deallocated { reset: false }` | `qubit_reset_skipped` |
/// | `Denied` | `allocation_denied` |
/// | `OwnershipViolation` | `ownership_violation` |
/// | `TakenOffline` | `qubit_faulty` / `qubit_maintenance` |
/// | `Restored` | `qubit_restored` |
pub struct AuditLogAllocationSink {
    log: Arc<dyn AuditLogApi>,
}

impl AuditLogAllocationSink {
    pub fn new(log: Arc<dyn AuditLogApi>) -> Self {
        Self { log }
    }
}

fn join_ids(ids: &[QubitId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn translate(event: &AllocationEvent) -> (AuditEventType, BTreeMap<String, String>) {
    match event {
        AllocationEvent::Allocated { qubit_ids, .. } => (
            AuditEventType::QubitAllocated,
            details([
                ("qubits", join_ids(qubit_ids)),
                ("count", qubit_ids.len().to_string()),
            ]),
        ),
        AllocationEvent::Deallocated {
            qubit_ids, reset, ..
        } => (
            if *reset {
                AuditEventType::QubitDeallocated
            } else {
                AuditEventType::QubitResetSkipped
            },
            details([
                ("qubits", join_ids(qubit_ids)),
                ("reset", reset.to_string()),
            ]),
        ),
        AllocationEvent::Denied {
            requested, kind, ..
        } => (
            AuditEventType::AllocationDenied,
            details([
                ("requested", requested.to_string()),
                ("reason", kind.to_string()),
            ]),
        ),
        AllocationEvent::OwnershipViolation {
            qubit_ids, action, ..
        } => (
            AuditEventType::OwnershipViolation,
            details([
                ("qubits", join_ids(qubit_ids)),
                ("action", action.to_string()),
            ]),
        ),
        AllocationEvent::TakenOffline {
            qubit_id,
            state,
            evicted,
        } => {
            let event_type = if *state == QubitState::Faulty {
                AuditEventType::QubitFaulty
            } else {
                AuditEventType::QubitMaintenance
            };
            let mut entry = details([("qubit_id", qubit_id.to_string())]);
            if let Some(owner) = evicted {
                entry.insert("evicted".to_string(), owner.to_string());
            }
            (event_type, entry)
        }
        AllocationEvent::Restored { qubit_id } => (
            AuditEventType::QubitRestored,
            details([("qubit_id", qubit_id.to_string())]),
        ),
    }
}

impl AllocationAuditSink for AuditLogAllocationSink {
    fn record(&self, event: &AllocationEvent) {
        let (event_type, entry) = translate(event);
        if let Err(e) = self.log.append(event_type, event.tenant_id(), entry) {
            error!(
                event_type = %event_type,
                error = %e,
                "Failed to append allocation event to audit log"
            );
        }
    }
}
