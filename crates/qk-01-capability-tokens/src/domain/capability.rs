//! # Capability Vocabulary
//!
//! The closed set of capability atoms and the immutable set type tokens
//! carry. Capabilities are compared, never interpreted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::errors::TokenError;

/// One category of protected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Allocation,
    Reset,
    Measurement,
    Compute,
    Link,
    Send,
    Receive,
    Teleport,
    MagicState,
    Admin,
    Delegate,
    Debug,
}

impl Capability {
    /// Every capability, in canonical order.
    pub const ALL: [Capability; 12] = [
        Capability::Allocation,
        Capability::Reset,
        Capability::Measurement,
        Capability::Compute,
        Capability::Link,
        Capability::Send,
        Capability::Receive,
        Capability::Teleport,
        Capability::MagicState,
        Capability::Admin,
        Capability::Delegate,
        Capability::Debug,
    ];

    /// Stable wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allocation => "allocation",
            Self::Reset => "reset",
            Self::Measurement => "measurement",
            Self::Compute => "compute",
            Self::Link => "link",
            Self::Send => "send",
            Self::Receive => "receive",
            Self::Teleport => "teleport",
            Self::MagicState => "magic_state",
            Self::Admin => "admin",
            Self::Delegate => "delegate",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = TokenError;

    /// Decodes a wire name. Only used when rebuilding a token from its
    /// transport field map.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| TokenError::Malformed(format!("unknown capability '{}'", s)))
    }
}

/// An ordered set of capabilities.
///
/// Ordering is canonical, so two equal sets always encode to the same bytes
/// in the signing payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    /// Returns true if every capability in `self` is also in `other`.
    pub fn is_subset(&self, other: &CapabilitySet) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Capabilities in `self` that are not in `other`.
    pub fn difference(&self, other: &CapabilitySet) -> CapabilitySet {
        Self(self.0.difference(&other.0).copied().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    /// Canonical names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(Capability::as_str).collect()
    }

    /// Parses the comma-joined form produced by `Display`.
    pub fn parse_joined(joined: &str) -> Result<Self, TokenError> {
        if joined.is_empty() {
            return Ok(Self::new());
        }
        joined.split(',').map(str::parse::<Capability>).collect()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(","))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Capability; N]> for CapabilitySet {
    fn from(caps: [Capability; N]) -> Self {
        caps.into_iter().collect()
    }
}
