//! # Tamper-Evident Audit Log Subsystem (qk-02)
//!
//! Every kernel decision and lifecycle event is serialized into an
//! [`AuditRecord`] and hashed into an append-only Merkle accumulator. Any
//! later edit of a stored entry is detectable, and each entry has a
//! logarithmic inclusion proof that external verifiers can check against a
//! published root.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Deterministic records | fixed field order, sorted `details` |
//! | Sequence = leaf index | assigned under the append lock |
//! | Root is a function of the leaves | incremental spine update == rebuild |
//! | Leaf/node domain separation | `0x00` / `0x01` hash prefixes |
//! | Atomic append | one `Mutex` over entries and tree |
//!
//! ## Padding
//!
//! Odd tree levels either duplicate their last node
//! ([`PaddingStrategy::DuplicateLast`], the default) or pair it with a
//! zero sentinel ([`PaddingStrategy::Sentinel`]). Duplication lets
//! `[a, b, c]` and `[a, b, c, c]` share a root; deployments that publish
//! roots to third parties should prefer the sentinel.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    details, hash_leaf, hash_node, AuditConfig, AuditError, AuditEventType, AuditRecord,
    AuditResult, AuditStatistics, Direction, EventQuery, InclusionProof, MerkleAccumulator,
    PaddingStrategy, ProofStep, SENTINEL_HASH,
};
pub use ports::{AppendReceipt, AuditLogApi};
pub use service::TamperEvidentAuditLog;
