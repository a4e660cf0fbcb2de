//! # Qubit Allocator Service
//!
//! Serializes every pool mutation behind one lock and reports each outcome
//! to the audit sink while the lock is held, so the audit order matches
//! the order in which the pool changed.

use parking_lot::Mutex;
use shared_types::{QubitId, SystemTimeSource, TenantId, TimeSource};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapters::NoOpAuditSink;
use crate::domain::{
    AllocationError, AllocationEvent, AllocationRecord, AllocationResult, AllocatorConfig,
    PhysicalQubit, PoolStatistics, QubitPool, QubitState, TenantQuota,
};
use crate::ports::{AllocationAuditSink, QubitAllocatorApi};

/// Physical qubit allocator.
pub struct QubitAllocator {
    pool: Mutex<QubitPool>,
    audit: Arc<dyn AllocationAuditSink>,
    time: Arc<dyn TimeSource>,
}

impl QubitAllocator {
    /// Allocator with no audit sink and the system clock.
    pub fn new(config: AllocatorConfig) -> Self {
        Self::with_dependencies(config, Arc::new(NoOpAuditSink), Arc::new(SystemTimeSource))
    }

    pub fn with_dependencies(
        config: AllocatorConfig,
        audit: Arc<dyn AllocationAuditSink>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        info!(
            pool_size = config.pool_size,
            default_max_qubits = config.default_max_qubits,
            "Qubit pool initialised"
        );
        Self {
            pool: Mutex::new(QubitPool::new(config)),
            audit,
            time,
        }
    }

    pub fn config(&self) -> AllocatorConfig {
        *self.pool.lock().config()
    }

    fn take_offline(
        &self,
        qubit_id: QubitId,
        state: QubitState,
    ) -> AllocationResult<Option<TenantId>> {
        let now = self.time.now();
        let mut pool = self.pool.lock();
        let evicted = pool.take_offline(qubit_id, state, now)?;

        info!(
            qubit_id = %qubit_id,
            state = %state,
            evicted = evicted.as_ref().map(TenantId::as_str),
            "Qubit taken offline"
        );
        self.audit.record(&AllocationEvent::TakenOffline {
            qubit_id,
            state,
            evicted: evicted.clone(),
        });
        Ok(evicted)
    }

    fn report_ownership_violation(
        &self,
        tenant_id: &TenantId,
        qubit_ids: Vec<QubitId>,
        action: &'static str,
    ) {
        warn!(
            tenant_id = %tenant_id,
            qubits = ?qubit_ids,
            action,
            "Qubit ownership violation"
        );
        self.audit.record(&AllocationEvent::OwnershipViolation {
            tenant_id: tenant_id.clone(),
            qubit_ids,
            action,
        });
    }
}

impl QubitAllocatorApi for QubitAllocator {
    fn allocate(
        &self,
        tenant_id: &TenantId,
        count: u32,
        preferred: &[QubitId],
    ) -> AllocationResult<Vec<QubitId>> {
        let now = self.time.now();
        let mut pool = self.pool.lock();

        match pool.allocate(tenant_id, count, preferred, now) {
            Ok(qubit_ids) => {
                debug!(tenant_id = %tenant_id, qubits = ?qubit_ids, "Qubits allocated");
                self.audit.record(&AllocationEvent::Allocated {
                    tenant_id: tenant_id.clone(),
                    qubit_ids: qubit_ids.clone(),
                });
                Ok(qubit_ids)
            }
            Err(e) => {
                warn!(
                    tenant_id = %tenant_id,
                    requested = count,
                    kind = e.kind(),
                    "Allocation denied"
                );
                self.audit.record(&AllocationEvent::Denied {
                    tenant_id: tenant_id.clone(),
                    requested: count,
                    kind: e.kind(),
                });
                Err(e)
            }
        }
    }

    fn deallocate(
        &self,
        tenant_id: &TenantId,
        qubit_ids: &[QubitId],
        reset: bool,
    ) -> AllocationResult<Vec<QubitId>> {
        let now = self.time.now();
        let mut pool = self.pool.lock();

        match pool.deallocate(tenant_id, qubit_ids, reset, now) {
            Ok(released) => {
                if reset {
                    debug!(tenant_id = %tenant_id, qubits = ?released, "Qubits released for reset");
                } else {
                    warn!(tenant_id = %tenant_id, qubits = ?released, "Qubits released without reset");
                }
                self.audit.record(&AllocationEvent::Deallocated {
                    tenant_id: tenant_id.clone(),
                    qubit_ids: released.clone(),
                    reset,
                });
                Ok(released)
            }
            Err(e) => {
                if let AllocationError::OwnershipError { qubit_ids, .. } = &e {
                    self.report_ownership_violation(tenant_id, qubit_ids.clone(), "deallocate");
                }
                Err(e)
            }
        }
    }

    fn verify_access(&self, tenant_id: &TenantId, qubit_id: QubitId) -> bool {
        let pool = self.pool.lock();
        let granted = pool.verify_access(tenant_id, qubit_id);
        if !granted {
            self.report_ownership_violation(tenant_id, vec![qubit_id], "access");
        }
        granted
    }

    fn require_access(&self, tenant_id: &TenantId, qubit_id: QubitId) -> AllocationResult<()> {
        if self.verify_access(tenant_id, qubit_id) {
            Ok(())
        } else {
            Err(AllocationError::OwnershipError {
                tenant_id: tenant_id.clone(),
                qubit_ids: vec![qubit_id],
            })
        }
    }

    fn complete_reset(&self, qubit_id: QubitId) -> AllocationResult<()> {
        self.pool.lock().complete_reset(qubit_id)?;
        debug!(qubit_id = %qubit_id, "Reset complete");
        Ok(())
    }

    fn complete_all_resets(&self) -> Vec<QubitId> {
        let freed = self.pool.lock().complete_all_resets();
        if !freed.is_empty() {
            debug!(count = freed.len(), "Pending resets completed");
        }
        freed
    }

    fn mark_faulty(&self, qubit_id: QubitId) -> AllocationResult<Option<TenantId>> {
        self.take_offline(qubit_id, QubitState::Faulty)
    }

    fn mark_maintenance(&self, qubit_id: QubitId) -> AllocationResult<Option<TenantId>> {
        self.take_offline(qubit_id, QubitState::Maintenance)
    }

    fn restore_qubit(&self, qubit_id: QubitId) -> AllocationResult<()> {
        let mut pool = self.pool.lock();
        pool.restore(qubit_id)?;
        info!(qubit_id = %qubit_id, "Qubit restored to pool");
        self.audit.record(&AllocationEvent::Restored { qubit_id });
        Ok(())
    }

    fn set_quota(&self, tenant_id: &TenantId, max_qubits: u32) -> AllocationResult<TenantQuota> {
        let quota = self.pool.lock().set_quota(tenant_id, max_qubits)?;
        info!(tenant_id = %tenant_id, max_qubits, "Tenant quota updated");
        Ok(quota)
    }

    fn quota(&self, tenant_id: &TenantId) -> TenantQuota {
        self.pool.lock().quota(tenant_id)
    }

    fn tenant_qubits(&self, tenant_id: &TenantId) -> Vec<QubitId> {
        self.pool.lock().tenant_qubits(tenant_id)
    }

    fn release_tenant(&self, tenant_id: &TenantId) -> AllocationResult<Vec<QubitId>> {
        let now = self.time.now();
        let mut pool = self.pool.lock();
        let released = pool.release_tenant(tenant_id, now)?;
        if !released.is_empty() {
            info!(tenant_id = %tenant_id, count = released.len(), "Tenant qubits released");
            self.audit.record(&AllocationEvent::Deallocated {
                tenant_id: tenant_id.clone(),
                qubit_ids: released.clone(),
                reset: true,
            });
        }
        Ok(released)
    }

    fn pool_statistics(&self) -> PoolStatistics {
        self.pool.lock().statistics()
    }

    fn allocation_history(
        &self,
        tenant_id: Option<&TenantId>,
        limit: usize,
    ) -> Vec<AllocationRecord> {
        self.pool.lock().history(tenant_id, limit)
    }

    fn qubit(&self, qubit_id: QubitId) -> Option<PhysicalQubit> {
        self.pool.lock().qubit(qubit_id).cloned()
    }
}
