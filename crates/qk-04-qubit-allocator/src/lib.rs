//! # Qubit Allocator Subsystem (qk-04)
//!
//! Multi-tenant ownership of physical qubits. A qubit belongs to at most
//! one tenant, a tenant never holds more than its quota, and a released
//! qubit is purged before anyone else can claim it.
//!
//! ## Security Invariants
//!
//! | Invariant | Enforced by |
//! |-----------|-------------|
//! | Exclusive ownership | `PhysicalQubit` transitions, one pool lock |
//! | Quota bound | `QubitPool::allocate` checks quota before availability |
//! | No cross-tenant release | `QubitPool::deallocate` is all-or-nothing |
//! | Reset before reuse | `Resetting` is not `Free` |
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): qubits, quotas, the pool
//! - **Ports Layer** (`ports/`): [`QubitAllocatorApi`] inbound,
//!   [`AllocationAuditSink`] outbound
//! - **Adapters Layer** (`adapters/`): [`NoOpAuditSink`]
//! - **Service** (`service`): [`QubitAllocator`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::NoOpAuditSink;
pub use domain::{
    AllocationAction, AllocationError, AllocationEvent, AllocationRecord, AllocationResult,
    AllocatorConfig, PhysicalQubit, PoolStatistics, QubitPool, QubitState, TenantQuota,
    DEFAULT_MAX_HISTORY, DEFAULT_MAX_QUBITS, DEFAULT_POOL_SIZE,
};
pub use ports::{AllocationAuditSink, QubitAllocatorApi};
pub use service::QubitAllocator;
