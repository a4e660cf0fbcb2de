//! # Value Objects
//!
//! Configuration and counters for the Capability Mediator subsystem.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of decisions kept in memory.
pub const DEFAULT_MAX_DECISION_HISTORY: usize = 10_000;

/// Configuration for the mediator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    /// Deny operations missing from the requirement table. Turning this off
    /// treats them as requiring no capability.
    pub strict_mode: bool,
    /// Bound on the in-memory decision history. Zero disables it.
    pub max_decision_history: usize,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            strict_mode: true,
            max_decision_history: DEFAULT_MAX_DECISION_HISTORY,
        }
    }
}

/// Running counters over every check performed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediatorStatistics {
    pub checks_performed: u64,
    pub allowed: u64,
    pub denied: u64,
    /// Denials keyed by reason code.
    pub denials_by_reason: BTreeMap<String, u64>,
}
