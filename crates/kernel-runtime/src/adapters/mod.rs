//! # Adapters
//!
//! Cross-subsystem adapters that only the runtime can build, because they
//! need two subsystems at once.

pub mod allocation_audit;

pub use allocation_audit::AuditLogAllocationSink;
