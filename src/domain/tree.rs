use alloy::primitives::{
    keccak256,
    B256,
};
use thiserror::Error;

use crate::crypto::poseidon::{
    poseidon2,
    reduce_to_field,
};

use super::merkle::MerkleProof;

/// Default tree depth: 2^20 (~1M) leaves, matching the on-chain mixer.
pub const DEFAULT_TREE_DEPTH: usize = 20;

/// Depth bounds accepted by `CommitmentTree::new`.
pub const MAX_TREE_DEPTH: usize = 32;

/// Errors from tree construction and mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("tree depth must be between 1 and {MAX_TREE_DEPTH}, got {0}")]
    InvalidDepth(usize),

    #[error("leaf index {index} out of range for depth {depth}")]
    LeafOutOfRange { index: u64, depth: usize },

    #[error("tree is full ({capacity} leaves)")]
    TreeFull { capacity: u64 },
}

/// The canonical empty-leaf value: keccak of the pool's domain tag, reduced
/// into the field. Every unfilled leaf position holds this value.
pub fn zero_leaf() -> B256 {
    reduce_to_field(keccak256(b"privacy-pool"))
}

/// Precompute the zero-subtree table: `zeros[0]` is the empty leaf and
/// `zeros[i] = H(zeros[i-1], zeros[i-1])` is the hash of an empty subtree of
/// height `i`.
pub fn compute_zeros(depth: usize) -> Vec<B256> {
    let mut zeros = Vec::with_capacity(depth + 1);
    zeros.push(zero_leaf());
    for i in 1..=depth {
        let prev = zeros[i - 1];
        zeros.push(poseidon2(prev, prev));
    }
    zeros
}

/// Append-only fixed-depth binary Merkle tree over commitments.
///
/// Leaves are stored as an ordered sequence (insertion order is the ledger's
/// leaf index and is semantically meaningful). The root is a pure function of
/// that sequence: it is recomputed bottom-up on every query rather than
/// cached, so any two trees holding the same leaves agree on the root.
#[derive(Debug, Clone)]
pub struct CommitmentTree {
    depth: usize,
    zeros: Vec<B256>,
    leaves: Vec<B256>,
}

impl CommitmentTree {
    /// Create an empty tree of the given depth.
    pub fn new(depth: usize) -> Result<Self, TreeError> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(TreeError::InvalidDepth(depth));
        }
        Ok(Self {
            depth,
            zeros: compute_zeros(depth),
            leaves: Vec::new(),
        })
    }

    /// Rebuild a tree from a final leaf sequence.
    pub fn from_leaves(depth: usize, leaves: Vec<B256>) -> Result<Self, TreeError> {
        let mut tree = Self::new(depth)?;
        if leaves.len() as u64 > tree.capacity() {
            return Err(TreeError::TreeFull {
                capacity: tree.capacity(),
            });
        }
        tree.leaves = leaves;
        Ok(tree)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    /// Number of leaf slots occupied (including zero padding from gaps).
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// The zero-subtree value at a level (0 = leaf level).
    pub fn zero_at(&self, level: usize) -> B256 {
        self.zeros[level]
    }

    /// The leaf value at an index, or the empty-leaf value if unfilled.
    pub fn leaf(&self, index: u64) -> B256 {
        self.leaves
            .get(index as usize)
            .copied()
            .unwrap_or(self.zeros[0])
    }

    /// Place a leaf at an exact index, padding any intermediate unfilled
    /// positions with the empty-leaf value. Overwrites are allowed (the
    /// ledger is authoritative); indices are never compacted or reused.
    pub fn set_leaf(&mut self, index: u64, value: B256) -> Result<(), TreeError> {
        if index >= self.capacity() {
            return Err(TreeError::LeafOutOfRange {
                index,
                depth: self.depth,
            });
        }
        let index = index as usize;
        if index >= self.leaves.len() {
            self.leaves.resize(index + 1, self.zeros[0]);
        }
        self.leaves[index] = value;
        Ok(())
    }

    /// Append a leaf at the next free index. Rejects once capacity is
    /// reached rather than wrapping.
    pub fn append(&mut self, value: B256) -> Result<u64, TreeError> {
        let index = self.leaves.len() as u64;
        if index >= self.capacity() {
            return Err(TreeError::TreeFull {
                capacity: self.capacity(),
            });
        }
        self.leaves.push(value);
        Ok(index)
    }

    /// Recompute the root bottom-up. A node is the level's zero value when
    /// both children are absent; otherwise absent children fall back to the
    /// child level's zero value.
    pub fn root(&self) -> B256 {
        let mut level: Vec<B256> = self.leaves.clone();
        for depth in 0..self.depth {
            let parent_len = (level.len() + 1) / 2;
            let mut parents = Vec::with_capacity(parent_len);
            for i in 0..parent_len {
                let left = level.get(2 * i).copied().unwrap_or(self.zeros[depth]);
                let right = level
                    .get(2 * i + 1)
                    .copied()
                    .unwrap_or(self.zeros[depth]);
                parents.push(poseidon2(left, right));
            }
            level = parents;
        }
        level.first().copied().unwrap_or(self.zeros[self.depth])
    }

    /// Generate a Merkle proof for the leaf at `index`, substituting the
    /// level's zero value wherever a sibling is absent.
    pub fn proof(&self, index: u64) -> Result<MerkleProof, TreeError> {
        if index as usize >= self.leaves.len() {
            return Err(TreeError::LeafOutOfRange {
                index,
                depth: self.depth,
            });
        }

        let mut siblings = Vec::with_capacity(self.depth);
        let mut indices = Vec::with_capacity(self.depth);

        let mut level: Vec<B256> = self.leaves.clone();
        let mut idx = index as usize;

        for depth in 0..self.depth {
            let sibling_idx = idx ^ 1;
            siblings.push(
                level
                    .get(sibling_idx)
                    .copied()
                    .unwrap_or(self.zeros[depth]),
            );
            indices.push((idx % 2) as u8);

            let parent_len = (level.len() + 1) / 2;
            let mut parents = Vec::with_capacity(parent_len);
            for i in 0..parent_len {
                let left = level.get(2 * i).copied().unwrap_or(self.zeros[depth]);
                let right = level
                    .get(2 * i + 1)
                    .copied()
                    .unwrap_or(self.zeros[depth]);
                parents.push(poseidon2(left, right));
            }
            level = parents;
            idx /= 2;
        }

        Ok(MerkleProof {
            root: level.first().copied().unwrap_or(self.zeros[self.depth]),
            siblings,
            indices,
            leaf_index: index,
        })
    }
}
