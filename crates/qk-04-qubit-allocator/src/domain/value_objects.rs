//! # Value Objects
//!
//! Configuration, quotas, history records and statistics for the Qubit
//! Allocator subsystem.

use serde::{Deserialize, Serialize};
use shared_types::{QubitId, TenantId};

/// Default number of physical qubits.
pub const DEFAULT_POOL_SIZE: u32 = 64;

/// Default per-tenant quota.
pub const DEFAULT_MAX_QUBITS: u32 = 8;

/// Default bound on the allocation history.
pub const DEFAULT_MAX_HISTORY: usize = 10_000;

/// Configuration for the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Qubits `q0..q{pool_size-1}` are created at startup.
    pub pool_size: u32,
    /// Quota applied to a tenant until `set_quota` is called for it.
    pub default_max_qubits: u32,
    pub max_history: usize,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            default_max_qubits: DEFAULT_MAX_QUBITS,
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// Per-tenant allocation bound.
///
/// `allocated_qubits <= max_qubits` always holds, and `allocated_qubits`
/// equals the number of qubits the tenant owns in state `Allocated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantQuota {
    pub tenant_id: TenantId,
    pub max_qubits: u32,
    pub allocated_qubits: u32,
}

impl TenantQuota {
    pub fn new(tenant_id: TenantId, max_qubits: u32) -> Self {
        Self {
            tenant_id,
            max_qubits,
            allocated_qubits: 0,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.max_qubits.saturating_sub(self.allocated_qubits)
    }

    pub fn can_allocate(&self, count: u32) -> bool {
        self.allocated_qubits
            .checked_add(count)
            .is_some_and(|total| total <= self.max_qubits)
    }
}

/// What happened to a set of qubits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationAction {
    Allocated,
    Deallocated { reset: bool },
    /// Pulled from the tenant by a fault or maintenance.
    Evicted,
}

/// One entry of the allocation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub tenant_id: TenantId,
    pub qubit_ids: Vec<QubitId>,
    pub action: AllocationAction,
    pub timestamp: u64,
}

/// Pool-wide counts by state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatistics {
    pub total: u32,
    pub free: u32,
    pub allocated: u32,
    pub resetting: u32,
    pub faulty: u32,
    pub maintenance: u32,
    /// Tenants currently holding at least one qubit.
    pub tenants_with_allocations: u32,
}
