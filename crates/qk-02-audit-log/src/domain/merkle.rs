//! # Merkle Accumulator
//!
//! Append-only binary hash tree over opaque byte records.
//!
//! ALGORITHM: leaves are `H(0x00 || bytes)`, internal nodes are
//! `H(0x01 || left || right)` with SHA-256. An odd-length level completes
//! its last pair according to the configured [`PaddingStrategy`].
//!
//! ## Invariants
//!
//! - The root is a pure function of the leaf sequence: appending updates
//!   only the right spine and always equals a full rebuild.
//! - Changing any earlier leaf changes the root.
//! - Every proof the accumulator produces verifies against its root.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::Hash;

use super::errors::{AuditError, AuditResult};
use super::value_objects::{PaddingStrategy, SENTINEL_HASH};

const LEAF_DOMAIN: u8 = 0x00;
const NODE_DOMAIN: u8 = 0x01;

/// Hash of one record as it enters the tree.
pub fn hash_leaf(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_DOMAIN]);
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Parent of two adjacent nodes.
pub fn hash_node(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([NODE_DOMAIN]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Side on which a sibling sits relative to the running hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
}

/// One level of an inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub direction: Direction,
    pub sibling: Hash,
}

/// Proof that a leaf is included under a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub leaf_index: u64,
    pub leaf_hash: Hash,
    /// Root at the time the proof was produced.
    pub root: Hash,
    /// Siblings from the leaf level up to just below the root.
    pub steps: Vec<ProofStep>,
}

impl InclusionProof {
    /// Replays the path from `bytes` and compares with `expected_root`.
    ///
    /// For verifiers that hold a published root rather than the log.
    pub fn verify_against(&self, expected_root: &Hash, bytes: &[u8]) -> bool {
        let leaf = hash_leaf(bytes);
        if leaf != self.leaf_hash {
            return false;
        }
        self.replay(leaf) == *expected_root
    }

    fn replay(&self, leaf: Hash) -> Hash {
        self.steps.iter().fold(leaf, |current, step| match step.direction {
            Direction::Left => hash_node(&step.sibling, &current),
            Direction::Right => hash_node(&current, &step.sibling),
        })
    }
}

/// Incrementally maintained Merkle tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleAccumulator {
    /// `levels[0]` holds leaf hashes; the last level holds only the root.
    levels: Vec<Vec<Hash>>,
    padding: PaddingStrategy,
}

impl Default for MerkleAccumulator {
    fn default() -> Self {
        Self::new(PaddingStrategy::default())
    }
}

impl MerkleAccumulator {
    pub fn new(padding: PaddingStrategy) -> Self {
        Self {
            levels: vec![Vec::new()],
            padding,
        }
    }

    /// Builds an accumulator over `records` in one pass.
    pub fn from_records<'a, I>(padding: PaddingStrategy, records: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut acc = Self::new(padding);
        for bytes in records {
            acc.append(bytes);
        }
        acc
    }

    pub fn padding(&self) -> PaddingStrategy {
        self.padding
    }

    pub fn len(&self) -> u64 {
        self.levels[0].len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// Current root, or [`SENTINEL_HASH`] when empty.
    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(SENTINEL_HASH)
    }

    pub fn leaf_hash(&self, index: u64) -> Option<Hash> {
        self.levels[0].get(usize::try_from(index).ok()?).copied()
    }

    /// Hashes `bytes` in as the next leaf and returns the new root.
    pub fn append(&mut self, bytes: &[u8]) -> Hash {
        self.levels[0].push(hash_leaf(bytes));

        let mut height = 0;
        while self.levels[height].len() > 1 {
            let level = &self.levels[height];
            let parent_index = (level.len() - 1) / 2;
            let left = level[parent_index * 2];
            let right = match level.get(parent_index * 2 + 1) {
                Some(right) => *right,
                None => self.pad(&left),
            };
            let parent = hash_node(&left, &right);

            if self.levels.len() == height + 1 {
                self.levels.push(Vec::new());
            }
            let above = &mut self.levels[height + 1];
            if parent_index == above.len() {
                above.push(parent);
            } else {
                above[parent_index] = parent;
            }
            height += 1;
        }

        self.root()
    }

    /// Inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: u64) -> AuditResult<InclusionProof> {
        let len = self.len();
        let leaf_hash = self
            .leaf_hash(index)
            .ok_or(AuditError::IndexOutOfRange { index, len })?;

        let mut steps = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut position = index as usize;
        for level in &self.levels[..self.levels.len() - 1] {
            let (direction, sibling_index) = if position % 2 == 0 {
                (Direction::Right, position + 1)
            } else {
                (Direction::Left, position - 1)
            };
            let sibling = match level.get(sibling_index) {
                Some(sibling) => *sibling,
                None => self.pad(&level[position]),
            };
            steps.push(ProofStep { direction, sibling });
            position /= 2;
        }

        Ok(InclusionProof {
            leaf_index: index,
            leaf_hash,
            root: self.root(),
            steps,
        })
    }

    /// Verifies `proof` for `bytes` against the current root.
    pub fn verify(&self, proof: &InclusionProof, bytes: &[u8]) -> bool {
        if self.leaf_hash(proof.leaf_index) != Some(proof.leaf_hash) {
            return false;
        }
        proof.verify_against(&self.root(), bytes)
    }

    fn pad(&self, last: &Hash) -> Hash {
        match self.padding {
            PaddingStrategy::DuplicateLast => *last,
            PaddingStrategy::Sentinel => SENTINEL_HASH,
        }
    }
}
