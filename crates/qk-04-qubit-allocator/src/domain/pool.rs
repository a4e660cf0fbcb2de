//! # Qubit Pool
//!
//! All qubit records, tenant quotas and the allocation history. Every
//! method keeps quota counters and qubit states consistent with each other;
//! the service holds the pool behind one lock so that stays true under
//! concurrency.

use shared_types::{QubitId, TenantId};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use super::errors::{AllocationError, AllocationResult};
use super::qubit::{PhysicalQubit, QubitState};
use super::value_objects::{
    AllocationAction, AllocationRecord, AllocatorConfig, PoolStatistics, TenantQuota,
};

/// The shared hardware pool.
#[derive(Debug, Clone)]
pub struct QubitPool {
    qubits: BTreeMap<QubitId, PhysicalQubit>,
    quotas: HashMap<TenantId, TenantQuota>,
    history: VecDeque<AllocationRecord>,
    config: AllocatorConfig,
}

impl QubitPool {
    pub fn new(config: AllocatorConfig) -> Self {
        let qubits = (0..config.pool_size)
            .map(|i| (QubitId(i), PhysicalQubit::new(QubitId(i))))
            .collect();
        Self {
            qubits,
            quotas: HashMap::new(),
            history: VecDeque::new(),
            config,
        }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Claims `count` free qubits for `tenant_id`.
    ///
    /// Free ids from `preferred` are taken first, in the order given; the
    /// rest are the lowest free ids. Returned ids are sorted.
    pub fn allocate(
        &mut self,
        tenant_id: &TenantId,
        count: u32,
        preferred: &[QubitId],
        now: u64,
    ) -> AllocationResult<Vec<QubitId>> {
        if count == 0 {
            return Err(AllocationError::InvalidRequest(
                "qubit count must be positive".to_string(),
            ));
        }

        let quota = self.quota(tenant_id);
        if !quota.can_allocate(count) {
            return Err(AllocationError::QuotaExceeded {
                tenant_id: tenant_id.clone(),
                requested: count,
                allocated: quota.allocated_qubits,
                max: quota.max_qubits,
            });
        }

        let available = self.count_in(QubitState::Free);
        if available < count {
            return Err(AllocationError::ResourceExhausted {
                requested: count,
                available,
            });
        }

        let wanted = count as usize;
        let mut selected: BTreeSet<QubitId> = BTreeSet::new();
        for id in preferred {
            if selected.len() == wanted {
                break;
            }
            if self.qubits.get(id).is_some_and(PhysicalQubit::is_free) {
                selected.insert(*id);
            }
        }
        for (id, qubit) in &self.qubits {
            if selected.len() == wanted {
                break;
            }
            if qubit.is_free() {
                selected.insert(*id);
            }
        }

        for id in &selected {
            if let Some(qubit) = self.qubits.get_mut(id) {
                qubit.allocate(tenant_id.clone(), now)?;
            }
        }

        let qubit_ids: Vec<QubitId> = selected.into_iter().collect();
        self.quota_entry(tenant_id).allocated_qubits += count;
        self.push_history(tenant_id, &qubit_ids, AllocationAction::Allocated, now);
        Ok(qubit_ids)
    }

    /// Releases qubits owned by `tenant_id`.
    ///
    /// With `reset` the qubits go to `Resetting` and only become free after
    /// [`QubitPool::complete_reset`]. Nothing changes unless the tenant owns
    /// every listed id.
    pub fn deallocate(
        &mut self,
        tenant_id: &TenantId,
        qubit_ids: &[QubitId],
        reset: bool,
        now: u64,
    ) -> AllocationResult<Vec<QubitId>> {
        let requested: BTreeSet<QubitId> = qubit_ids.iter().copied().collect();
        if requested.is_empty() {
            return Err(AllocationError::InvalidRequest(
                "no qubits to deallocate".to_string(),
            ));
        }

        // Unknown ids are reported as not owned so existence is not leaked.
        let not_owned: Vec<QubitId> = requested
            .iter()
            .copied()
            .filter(|id| !self.verify_access(tenant_id, *id))
            .collect();
        if !not_owned.is_empty() {
            return Err(AllocationError::OwnershipError {
                tenant_id: tenant_id.clone(),
                qubit_ids: not_owned,
            });
        }

        for id in &requested {
            if let Some(qubit) = self.qubits.get_mut(id) {
                if reset {
                    qubit.begin_reset()?;
                } else {
                    qubit.release()?;
                }
            }
        }

        let released: Vec<QubitId> = requested.into_iter().collect();
        let quota = self.quota_entry(tenant_id);
        quota.allocated_qubits = quota
            .allocated_qubits
            .saturating_sub(released.len() as u32);
        self.push_history(
            tenant_id,
            &released,
            AllocationAction::Deallocated { reset },
            now,
        );
        Ok(released)
    }

    /// Finishes the purge of a `Resetting` qubit.
    pub fn complete_reset(&mut self, qubit_id: QubitId) -> AllocationResult<()> {
        self.qubit_mut(qubit_id)?.complete_reset()
    }

    /// Finishes every pending reset. Returns the qubits freed.
    pub fn complete_all_resets(&mut self) -> Vec<QubitId> {
        let mut freed = Vec::new();
        for (id, qubit) in self.qubits.iter_mut() {
            if qubit.state() == QubitState::Resetting && qubit.complete_reset().is_ok() {
                freed.push(*id);
            }
        }
        freed
    }

    /// True iff `qubit_id` is allocated to `tenant_id`.
    pub fn verify_access(&self, tenant_id: &TenantId, qubit_id: QubitId) -> bool {
        self.qubits
            .get(&qubit_id)
            .is_some_and(|q| q.is_owned_by(tenant_id))
    }

    /// Moves a qubit to `Faulty` or `Maintenance`, evicting any owner
    /// without reset.
    pub fn take_offline(
        &mut self,
        qubit_id: QubitId,
        state: QubitState,
        now: u64,
    ) -> AllocationResult<Option<TenantId>> {
        let evicted = self.qubit_mut(qubit_id)?.take_offline(state)?;
        if let Some(owner) = &evicted {
            let quota = self.quota_entry(owner);
            quota.allocated_qubits = quota.allocated_qubits.saturating_sub(1);
            self.push_history(owner, &[qubit_id], AllocationAction::Evicted, now);
        }
        Ok(evicted)
    }

    /// Returns an offline qubit to the free pool.
    pub fn restore(&mut self, qubit_id: QubitId) -> AllocationResult<()> {
        self.qubit_mut(qubit_id)?.restore()
    }

    /// Sets `tenant_id`'s quota. Refuses to go below what it holds now.
    pub fn set_quota(
        &mut self,
        tenant_id: &TenantId,
        max_qubits: u32,
    ) -> AllocationResult<TenantQuota> {
        let quota = self.quota_entry(tenant_id);
        if max_qubits < quota.allocated_qubits {
            return Err(AllocationError::InvalidRequest(format!(
                "quota {} is below the {} qubits already allocated",
                max_qubits, quota.allocated_qubits
            )));
        }
        quota.max_qubits = max_qubits;
        Ok(quota.clone())
    }

    /// Current quota, or the default one for an unseen tenant.
    pub fn quota(&self, tenant_id: &TenantId) -> TenantQuota {
        self.quotas
            .get(tenant_id)
            .cloned()
            .unwrap_or_else(|| TenantQuota::new(tenant_id.clone(), self.config.default_max_qubits))
    }

    /// Qubits `tenant_id` holds, sorted.
    pub fn tenant_qubits(&self, tenant_id: &TenantId) -> Vec<QubitId> {
        self.qubits
            .values()
            .filter(|q| q.is_owned_by(tenant_id))
            .map(PhysicalQubit::qubit_id)
            .collect()
    }

    /// Releases everything `tenant_id` holds, with reset.
    pub fn release_tenant(
        &mut self,
        tenant_id: &TenantId,
        now: u64,
    ) -> AllocationResult<Vec<QubitId>> {
        let held = self.tenant_qubits(tenant_id);
        if held.is_empty() {
            return Ok(held);
        }
        self.deallocate(tenant_id, &held, true, now)
    }

    pub fn qubit(&self, qubit_id: QubitId) -> Option<&PhysicalQubit> {
        self.qubits.get(&qubit_id)
    }

    pub fn statistics(&self) -> PoolStatistics {
        let mut stats = PoolStatistics {
            total: self.qubits.len() as u32,
            ..PoolStatistics::default()
        };
        for qubit in self.qubits.values() {
            match qubit.state() {
                QubitState::Free => stats.free += 1,
                QubitState::Allocated => stats.allocated += 1,
                QubitState::Resetting => stats.resetting += 1,
                QubitState::Faulty => stats.faulty += 1,
                QubitState::Maintenance => stats.maintenance += 1,
            }
        }
        stats.tenants_with_allocations =
            self.quotas.values().filter(|q| q.allocated_qubits > 0).count() as u32;
        stats
    }

    /// Most recent history entries, oldest first, optionally for one
    /// tenant.
    pub fn history(&self, tenant_id: Option<&TenantId>, limit: usize) -> Vec<AllocationRecord> {
        let matching: Vec<&AllocationRecord> = self
            .history
            .iter()
            .filter(|r| tenant_id.map_or(true, |t| &r.tenant_id == t))
            .collect();
        let skip = matching.len().saturating_sub(limit);
        matching.into_iter().skip(skip).cloned().collect()
    }

    fn count_in(&self, state: QubitState) -> u32 {
        self.qubits.values().filter(|q| q.state() == state).count() as u32
    }

    fn qubit_mut(&mut self, qubit_id: QubitId) -> AllocationResult<&mut PhysicalQubit> {
        self.qubits
            .get_mut(&qubit_id)
            .ok_or(AllocationError::UnknownQubit(qubit_id))
    }

    fn quota_entry(&mut self, tenant_id: &TenantId) -> &mut TenantQuota {
        let default_max = self.config.default_max_qubits;
        self.quotas
            .entry(tenant_id.clone())
            .or_insert_with(|| TenantQuota::new(tenant_id.clone(), default_max))
    }

    fn push_history(
        &mut self,
        tenant_id: &TenantId,
        qubit_ids: &[QubitId],
        action: AllocationAction,
        timestamp: u64,
    ) {
        if self.config.max_history == 0 {
            return;
        }
        if self.history.len() == self.config.max_history {
            self.history.pop_front();
        }
        self.history.push_back(AllocationRecord {
            tenant_id: tenant_id.clone(),
            qubit_ids: qubit_ids.to_vec(),
            action,
            timestamp,
        });
    }
}
