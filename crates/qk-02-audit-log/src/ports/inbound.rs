//! # Inbound Ports (Driving Ports)
//!
//! Public API exposed by the Audit Log subsystem.

use shared_types::{Hash, TenantId};
use std::collections::BTreeMap;

use crate::domain::{
    AuditEventType, AuditRecord, AuditResult, AuditStatistics, EventQuery, InclusionProof,
};

/// Position and root after an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendReceipt {
    pub sequence_number: u64,
    pub root: Hash,
}

/// Append and query surface of a tamper-evident log.
pub trait AuditLogApi: Send + Sync {
    /// Records an event and folds it into the Merkle root.
    fn append(
        &self,
        event_type: AuditEventType,
        tenant_id: Option<&TenantId>,
        details: BTreeMap<String, String>,
    ) -> AuditResult<AppendReceipt>;

    fn get_events(&self, query: &EventQuery) -> Vec<AuditRecord>;

    fn get_statistics(&self) -> AuditStatistics;

    fn get_root_hash(&self) -> Hash;

    fn get_proof(&self, index: u64) -> AuditResult<InclusionProof>;

    /// True if entry `index` still matches its leaf hash.
    fn verify_entry(&self, index: u64) -> AuditResult<bool>;

    /// True if every entry in `start..end` verifies.
    fn verify_integrity(&self, start: u64, end: u64) -> AuditResult<bool>;

    /// Index of the first entry that no longer verifies.
    fn detect_tampering(&self) -> Option<u64>;
}
