//! # Value Objects
//!
//! Configuration and statistics for the Capability Token subsystem.

use serde::{Deserialize, Serialize};

/// Default token lifetime: one hour.
pub const DEFAULT_TTL_SECS: u64 = 3_600;

/// Default bound on delegation chain length.
pub const DEFAULT_MAX_DELEGATION_DEPTH: u32 = 8;

/// Configuration for the token manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Lifetime applied when the caller does not supply a TTL.
    pub default_ttl_secs: u64,
    /// Maximum `delegation_depth` any token may reach.
    pub max_delegation_depth: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: DEFAULT_TTL_SECS,
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
        }
    }
}

/// Counters describing the token registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStatistics {
    /// Tokens minted by `create` (including delegated ones).
    pub issued: u64,
    /// Tokens minted by `attenuate`.
    pub attenuated: u64,
    /// Tokens currently held in the registry.
    pub active: usize,
    /// Ids ever revoked. Never shrinks.
    pub revoked: usize,
    /// Tokens removed by garbage collection.
    pub collected: u64,
}
