//! # Domain Layer
//!
//! Pure capability-token logic: the capability vocabulary, the signed token
//! and its canonical signing payload.
//!
//! This module contains NO shared mutable state. The registry, revocation
//! set and locking live in [`crate::service`].

pub mod capability;
pub mod errors;
pub mod token;
pub mod value_objects;

pub use capability::*;
pub use errors::*;
pub use token::*;
pub use value_objects::*;
