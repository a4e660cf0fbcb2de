//! # Capability Mediator Subsystem (qk-03)
//!
//! Complete, fail-closed mediation of protected operations. Each operation
//! name maps to a required capability set; a caller's token must verify
//! and cover that set before the operation runs.
//!
//! ## Decision Flow
//!
//! ```text
//! check_capability(token, op)
//!        │
//!        ├─ op unmapped & strict ──────────→ deny (unmapped_operation)
//!        ├─ token fails verification ──────→ deny (token reason)
//!        ├─ required − token caps ≠ ∅ ─────→ deny (missing_capabilities)
//!        └─ consume one use ───────────────→ allow
//!                                              │
//!                 counters + history + auditor ┘
//! ```
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): requirement table, decisions, errors
//! - **Ports Layer** (`ports/`): [`CapabilityMediatorApi`] inbound;
//!   [`OperationRequirements`], [`TokenAuthority`], [`DecisionAuditor`]
//!   outbound
//! - **Adapters Layer** (`adapters/`): qk-01 token manager, qk-02 audit log
//! - **Service** (`service`): [`CapabilityMediator`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{AuditLogDecisionAuditor, NullDecisionAuditor};
pub use domain::{
    Decision, DecisionReason, MediationError, MediationResult, MediatorConfig,
    MediatorStatistics, StaticRequirementTable, DEFAULT_MAX_DECISION_HISTORY,
};
pub use ports::{CapabilityMediatorApi, DecisionAuditor, OperationRequirements, TokenAuthority};
pub use service::CapabilityMediator;
