//! # Inbound Ports (Driving Ports)
//!
//! Public API exposed by the Qubit Allocator subsystem.

use shared_types::{QubitId, TenantId};

use crate::domain::{
    AllocationRecord, AllocationResult, PhysicalQubit, PoolStatistics, TenantQuota,
};

/// Primary API for the Qubit Allocator subsystem.
pub trait QubitAllocatorApi: Send + Sync {
    /// Claims `count` qubits, preferring free ids from `preferred`.
    ///
    /// ## Returns
    ///
    /// - `Err(QuotaExceeded)`: checked first
    /// - `Err(ResourceExhausted)`: fewer than `count` free pool-wide
    fn allocate(
        &self,
        tenant_id: &TenantId,
        count: u32,
        preferred: &[QubitId],
    ) -> AllocationResult<Vec<QubitId>>;

    /// Releases qubits the tenant owns. `reset == false` skips the purge
    /// and is audited as such.
    fn deallocate(
        &self,
        tenant_id: &TenantId,
        qubit_ids: &[QubitId],
        reset: bool,
    ) -> AllocationResult<Vec<QubitId>>;

    /// Mandatory ownership check before touching a named qubit.
    fn verify_access(&self, tenant_id: &TenantId, qubit_id: QubitId) -> bool;

    /// Error form of [`QubitAllocatorApi::verify_access`].
    fn require_access(&self, tenant_id: &TenantId, qubit_id: QubitId) -> AllocationResult<()>;

    fn complete_reset(&self, qubit_id: QubitId) -> AllocationResult<()>;

    fn complete_all_resets(&self) -> Vec<QubitId>;

    /// Pulls a qubit out of service without reset. Returns the evicted
    /// owner.
    fn mark_faulty(&self, qubit_id: QubitId) -> AllocationResult<Option<TenantId>>;

    fn mark_maintenance(&self, qubit_id: QubitId) -> AllocationResult<Option<TenantId>>;

    fn restore_qubit(&self, qubit_id: QubitId) -> AllocationResult<()>;

    fn set_quota(&self, tenant_id: &TenantId, max_qubits: u32) -> AllocationResult<TenantQuota>;

    fn quota(&self, tenant_id: &TenantId) -> TenantQuota;

    fn tenant_qubits(&self, tenant_id: &TenantId) -> Vec<QubitId>;

    /// Releases everything the tenant holds, with reset.
    fn release_tenant(&self, tenant_id: &TenantId) -> AllocationResult<Vec<QubitId>>;

    fn pool_statistics(&self) -> PoolStatistics;

    fn allocation_history(&self, tenant_id: Option<&TenantId>, limit: usize)
        -> Vec<AllocationRecord>;

    fn qubit(&self, qubit_id: QubitId) -> Option<PhysicalQubit>;
}
