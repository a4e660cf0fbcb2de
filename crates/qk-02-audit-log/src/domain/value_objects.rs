//! # Value Objects
//!
//! Configuration, query filters and statistics for the Audit Log subsystem.

use serde::{Deserialize, Serialize};
use shared_types::{Hash, TenantId};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::record::AuditEventType;

/// Hash used to pad odd-length levels under [`PaddingStrategy::Sentinel`],
/// and the root of an empty accumulator.
pub const SENTINEL_HASH: Hash = [0u8; 32];

/// How an odd-length tree level is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingStrategy {
    /// Pair the last node with itself.
    #[default]
    DuplicateLast,
    /// Pair the last node with [`SENTINEL_HASH`]. Two different leaf
    /// sequences can then never share a level by duplication.
    Sentinel,
}

impl PaddingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateLast => "duplicate_last",
            Self::Sentinel => "sentinel",
        }
    }
}

impl fmt::Display for PaddingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaddingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "duplicate_last" | "duplicate" => Ok(Self::DuplicateLast),
            "sentinel" => Ok(Self::Sentinel),
            other => Err(format!("unknown padding strategy '{}'", other)),
        }
    }
}

/// Configuration for the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub padding: PaddingStrategy,
}

/// Filter for [`crate::TamperEvidentAuditLog::get_events`].
///
/// Every populated field must match. Results are in sequence order; with a
/// `limit`, only the most recent matches are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub tenant_id: Option<TenantId>,
    pub event_type: Option<AuditEventType>,
    /// Inclusive `(from, to)` timestamp bounds.
    pub time_range: Option<(u64, u64)>,
    pub limit: Option<usize>,
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tenant(mut self, tenant_id: impl Into<TenantId>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn event_type(mut self, event_type: AuditEventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn between(mut self, from: u64, to: u64) -> Self {
        self.time_range = Some((from, to));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Summary of the log's contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStatistics {
    pub entries: u64,
    pub by_event_type: BTreeMap<String, u64>,
    pub by_tenant: BTreeMap<String, u64>,
    pub first_timestamp: Option<u64>,
    pub last_timestamp: Option<u64>,
    /// Current Merkle root, hex encoded.
    pub root_hash: String,
    pub padding: PaddingStrategy,
}
