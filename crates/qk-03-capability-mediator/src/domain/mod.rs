//! # Domain Layer
//!
//! The static operation table, mediation decisions and their errors.

pub mod decision;
pub mod errors;
pub mod requirements;
pub mod value_objects;

pub use decision::*;
pub use errors::*;
pub use requirements::*;
pub use value_objects::*;
