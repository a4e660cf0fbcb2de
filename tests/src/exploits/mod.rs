//! # Exploit Simulations
//!
//! Attacks an untrusted tenant or a compromised component could attempt
//! against the kernel, each expected to fail closed and leave an audit
//! trail.
//!
//! | Module | Attack surface |
//! |--------|----------------|
//! | `token_forgery` | capability tokens in transit |
//! | `audit_tampering` | stored audit entries |
//! | `tenant_isolation` | physical qubit ownership |

pub mod audit_tampering;
pub mod tenant_isolation;
pub mod token_forgery;
