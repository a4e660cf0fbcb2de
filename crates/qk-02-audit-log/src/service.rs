//! # Tamper-Evident Audit Log Service
//!
//! Serializes each event, stores the bytes and folds them into a
//! [`MerkleAccumulator`]. Sequence assignment, storage and the tree update
//! share one lock, so a proof request never observes a half-applied append.

use parking_lot::Mutex;
use shared_types::{Hash, SystemTimeSource, TenantId, TimeSource};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::domain::{
    AuditConfig, AuditError, AuditEventType, AuditRecord, AuditResult, AuditStatistics,
    EventQuery, InclusionProof, MerkleAccumulator,
};
use crate::ports::{AppendReceipt, AuditLogApi};

struct StoredEntry {
    record: AuditRecord,
    /// Exactly the bytes hashed into the leaf.
    bytes: Vec<u8>,
}

struct LogState {
    accumulator: MerkleAccumulator,
    entries: Vec<StoredEntry>,
}

impl LogState {
    fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    fn entry(&self, index: u64) -> AuditResult<&StoredEntry> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .ok_or(AuditError::IndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    fn entry_verifies(&self, index: u64) -> AuditResult<bool> {
        let entry = self.entry(index)?;
        let proof = self.accumulator.proof(index)?;
        Ok(self.accumulator.verify(&proof, &entry.bytes))
    }
}

/// Append-only audit log with Merkle inclusion proofs.
pub struct TamperEvidentAuditLog {
    config: AuditConfig,
    time: Arc<dyn TimeSource>,
    state: Mutex<LogState>,
}

impl TamperEvidentAuditLog {
    pub fn new(config: AuditConfig) -> Self {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(config: AuditConfig, time: Arc<dyn TimeSource>) -> Self {
        Self {
            config,
            time,
            state: Mutex::new(LogState {
                accumulator: MerkleAccumulator::new(config.padding),
                entries: Vec::new(),
            }),
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn len(&self) -> u64 {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Stored bytes of entry `index`, as hashed into the tree.
    pub fn entry_bytes(&self, index: u64) -> AuditResult<Vec<u8>> {
        Ok(self.state.lock().entry(index)?.bytes.clone())
    }

    /// Decoded record of entry `index`.
    pub fn record(&self, index: u64) -> AuditResult<AuditRecord> {
        Ok(self.state.lock().entry(index)?.record.clone())
    }

    /// Verifies a proof for `bytes` against the current root.
    pub fn verify_proof(&self, proof: &InclusionProof, bytes: &[u8]) -> bool {
        self.state.lock().accumulator.verify(proof, bytes)
    }

    /// Overwrites the stored bytes of entry `index` in place, leaving the
    /// tree untouched. Test support for tamper detection.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn tamper_entry_bytes<F>(&self, index: u64, mutate: F) -> AuditResult<()>
    where
        F: FnOnce(&mut Vec<u8>),
    {
        let mut state = self.state.lock();
        let len = state.len();
        let entry = usize::try_from(index)
            .ok()
            .and_then(|i| state.entries.get_mut(i))
            .ok_or(AuditError::IndexOutOfRange { index, len })?;
        mutate(&mut entry.bytes);
        Ok(())
    }
}

impl AuditLogApi for TamperEvidentAuditLog {
    fn append(
        &self,
        event_type: AuditEventType,
        tenant_id: Option<&TenantId>,
        details: BTreeMap<String, String>,
    ) -> AuditResult<AppendReceipt> {
        let timestamp = self.time.now();
        let mut state = self.state.lock();

        let record = AuditRecord {
            event_type,
            tenant_id: tenant_id.cloned(),
            timestamp,
            details,
            sequence_number: state.len(),
        };
        let bytes = record.to_bytes()?;
        let root = state.accumulator.append(&bytes);
        let sequence_number = record.sequence_number;
        state.entries.push(StoredEntry { record, bytes });

        debug!(
            sequence = sequence_number,
            event_type = %event_type,
            root = %hex::encode(&root[..8]),
            "Audit entry appended"
        );
        Ok(AppendReceipt {
            sequence_number,
            root,
        })
    }

    fn get_events(&self, query: &EventQuery) -> Vec<AuditRecord> {
        let state = self.state.lock();
        let mut matched: Vec<AuditRecord> = state
            .entries
            .iter()
            .map(|e| &e.record)
            .filter(|r| {
                query
                    .tenant_id
                    .as_ref()
                    .map_or(true, |t| r.tenant_id.as_ref() == Some(t))
            })
            .filter(|r| query.event_type.map_or(true, |t| r.event_type == t))
            .filter(|r| {
                query
                    .time_range
                    .map_or(true, |(from, to)| r.timestamp >= from && r.timestamp <= to)
            })
            .cloned()
            .collect();

        if let Some(limit) = query.limit {
            let skip = matched.len().saturating_sub(limit);
            matched.drain(..skip);
        }
        matched
    }

    fn get_statistics(&self) -> AuditStatistics {
        let state = self.state.lock();
        let mut stats = AuditStatistics {
            entries: state.len(),
            root_hash: hex::encode(state.accumulator.root()),
            padding: self.config.padding,
            ..AuditStatistics::default()
        };

        for entry in &state.entries {
            let record = &entry.record;
            *stats
                .by_event_type
                .entry(record.event_type.as_str().to_string())
                .or_default() += 1;
            if let Some(tenant) = &record.tenant_id {
                *stats.by_tenant.entry(tenant.to_string()).or_default() += 1;
            }
        }
        stats.first_timestamp = state.entries.first().map(|e| e.record.timestamp);
        stats.last_timestamp = state.entries.last().map(|e| e.record.timestamp);
        stats
    }

    fn get_root_hash(&self) -> Hash {
        self.state.lock().accumulator.root()
    }

    fn get_proof(&self, index: u64) -> AuditResult<InclusionProof> {
        let state = self.state.lock();
        if state.entries.is_empty() {
            return Err(AuditError::EmptyLog);
        }
        state.accumulator.proof(index)
    }

    fn verify_entry(&self, index: u64) -> AuditResult<bool> {
        let state = self.state.lock();
        let ok = state.entry_verifies(index)?;
        if !ok {
            warn!(sequence = index, "Audit entry failed verification");
        }
        Ok(ok)
    }

    fn verify_integrity(&self, start: u64, end: u64) -> AuditResult<bool> {
        let state = self.state.lock();
        let len = state.len();
        if start >= end || end > len {
            return Err(AuditError::InvalidRange { start, end, len });
        }

        for index in start..end {
            if !state.entry_verifies(index)? {
                warn!(sequence = index, start, end, "Audit range failed verification");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn detect_tampering(&self) -> Option<u64> {
        let state = self.state.lock();
        let tampered = (0..state.len()).find(|&index| !matches!(state.entry_verifies(index), Ok(true)));
        if let Some(index) = tampered {
            error!(sequence = index, "Audit log tampering detected");
        }
        tampered
    }
}
