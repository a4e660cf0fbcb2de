//! # Capability Token Subsystem (qk-01)
//!
//! Unforgeable, attenuable capability tokens for the security kernel. A
//! token names a set of capabilities, the tenant holding it and its
//! delegation lineage, and is authenticated by an HMAC-SHA256 tag.
//!
//! ## Responsibilities
//!
//! - Issue tokens with a TTL, an optional use limit and an optional parent
//! - Verify revocation, expiry, use limit and signature
//! - Attenuate: derive a token carrying a subset of the source's rights
//! - Consume uses atomically so a limit of N admits exactly N operations
//! - Revoke by id and garbage-collect expired tokens
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Non-empty capability set | `CapabilityToken::sign_draft`, `from_field_map` |
//! | Attenuation never amplifies | `TokenManager::attenuate`, `create` with parent |
//! | Bounded delegation depth | `TokenConfig::max_delegation_depth` |
//! | Exact use limits | verify + consume under one write lock |
//! | Lineage containment | re-checked on every verification |
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): capabilities, tokens, errors, config
//! - **Ports Layer** (`ports/`): [`CapabilityTokenApi`]
//! - **Service** (`service`): [`TokenManager`], the registry-backed issuer

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    Capability, CapabilitySet, CapabilityToken, TokenConfig, TokenError, TokenId, TokenResult,
    TokenStatistics, DEFAULT_MAX_DELEGATION_DEPTH, DEFAULT_TTL_SECS,
};
pub use ports::{CapabilityTokenApi, TokenRequest};
pub use service::TokenManager;
