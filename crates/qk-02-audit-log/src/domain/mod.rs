//! # Domain Layer
//!
//! The Merkle accumulator, the audit record format and their errors.
//! Nothing in here locks or reads the clock.

pub mod errors;
pub mod merkle;
pub mod record;
pub mod value_objects;

pub use errors::*;
pub use merkle::*;
pub use record::*;
pub use value_objects::*;
