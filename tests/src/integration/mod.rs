//! # Integration Tests
//!
//! The mediator, token manager, audit log and allocator wired together
//! through `SecurityKernel`, the way an operation-dispatch layer uses them.

pub mod concurrency;
pub mod scenarios;
