//! # Adapters Layer
//!
//! Bindings from the mediator's driven ports onto the token manager and
//! the tamper-evident audit log.

pub mod audit_trail;
pub mod token_authority;

pub use audit_trail::{AuditLogDecisionAuditor, NullDecisionAuditor};
