//! # Audit Records
//!
//! The closed event vocabulary and the record written for each event.
//!
//! Records serialize through `serde_json` with struct fields in declaration
//! order and `details` as a sorted map, so equal records always produce
//! equal bytes.

use serde::{Deserialize, Serialize};
use shared_types::TenantId;
use std::collections::BTreeMap;
use std::fmt;

use super::errors::{AuditError, AuditResult};

/// Every kind of event the kernel records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    TokenIssued,
    TokenAttenuated,
    TokenRevoked,
    TokensCollected,
    CapabilityGranted,
    CapabilityDenied,
    QubitAllocated,
    QubitDeallocated,
    QubitResetSkipped,
    AllocationDenied,
    OwnershipViolation,
    QubitFaulty,
    QubitMaintenance,
    QubitRestored,
    SecurityViolation,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenIssued => "token_issued",
            Self::TokenAttenuated => "token_attenuated",
            Self::TokenRevoked => "token_revoked",
            Self::TokensCollected => "tokens_collected",
            Self::CapabilityGranted => "capability_granted",
            Self::CapabilityDenied => "capability_denied",
            Self::QubitAllocated => "qubit_allocated",
            Self::QubitDeallocated => "qubit_deallocated",
            Self::QubitResetSkipped => "qubit_reset_skipped",
            Self::AllocationDenied => "allocation_denied",
            Self::OwnershipViolation => "ownership_violation",
            Self::QubitFaulty => "qubit_faulty",
            Self::QubitMaintenance => "qubit_maintenance",
            Self::QubitRestored => "qubit_restored",
            Self::SecurityViolation => "security_violation",
        }
    }

    /// Events that record a refused or suspicious action.
    pub fn is_security_relevant(&self) -> bool {
        matches!(
            self,
            Self::CapabilityDenied
                | Self::AllocationDenied
                | Self::OwnershipViolation
                | Self::QubitResetSkipped
                | Self::SecurityViolation
        )
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub event_type: AuditEventType,
    /// `None` for kernel-wide events such as garbage collection.
    pub tenant_id: Option<TenantId>,
    pub timestamp: u64,
    pub details: BTreeMap<String, String>,
    /// Position in the log; equal to the Merkle leaf index.
    pub sequence_number: u64,
}

impl AuditRecord {
    /// Canonical bytes hashed into the accumulator.
    pub fn to_bytes(&self) -> AuditResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| AuditError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> AuditResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| AuditError::Serialization(e.to_string()))
    }

    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }
}

/// Builds a `details` map from key/value pairs.
pub fn details<K, V, I>(pairs: I) -> BTreeMap<String, String>
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
