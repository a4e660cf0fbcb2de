//! # Domain Layer
//!
//! Qubit records, tenant quotas and the pool that ties them together.
//! The pool is plain data; locking and auditing live in the service.

pub mod errors;
pub mod events;
pub mod pool;
pub mod qubit;
pub mod value_objects;

pub use errors::*;
pub use events::*;
pub use pool::*;
pub use qubit::*;
pub use value_objects::*;
