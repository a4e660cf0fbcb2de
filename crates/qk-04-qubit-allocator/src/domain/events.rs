//! # Allocation Events
//!
//! Facts the allocator reports to its [`crate::ports::AllocationAuditSink`].

use shared_types::{QubitId, TenantId};

use super::qubit::QubitState;

/// An auditable allocator outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationEvent {
    Allocated {
        tenant_id: TenantId,
        qubit_ids: Vec<QubitId>,
    },
    Deallocated {
        tenant_id: TenantId,
        qubit_ids: Vec<QubitId>,
        reset: bool,
    },
    /// An allocation request was refused.
    Denied {
        tenant_id: TenantId,
        requested: u32,
        kind: &'static str,
    },
    /// A tenant touched or released qubits it does not own.
    OwnershipViolation {
        tenant_id: TenantId,
        qubit_ids: Vec<QubitId>,
        action: &'static str,
    },
    TakenOffline {
        qubit_id: QubitId,
        state: QubitState,
        evicted: Option<TenantId>,
    },
    Restored {
        qubit_id: QubitId,
    },
}

impl AllocationEvent {
    pub fn tenant_id(&self) -> Option<&TenantId> {
        match self {
            Self::Allocated { tenant_id, .. }
            | Self::Deallocated { tenant_id, .. }
            | Self::Denied { tenant_id, .. }
            | Self::OwnershipViolation { tenant_id, .. } => Some(tenant_id),
            Self::TakenOffline { evicted, .. } => evicted.as_ref(),
            Self::Restored { .. } => None,
        }
    }
}
