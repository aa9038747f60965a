use alloy::primitives::B256;
use serde::{
    Deserialize,
    Serialize,
};

use crate::crypto::poseidon::poseidon2;

/// Merkle proof for a commitment in the pool tree.
///
/// Generated on demand and never cached: the tree may grow between requests
/// and the siblings are only valid against the root captured here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Root the proof was generated against.
    pub root: B256,
    /// Sibling hashes along the path from leaf to root.
    pub siblings: Vec<B256>,
    /// Index bits per level: 0 = current node is the left child,
    /// 1 = right child.
    pub indices: Vec<u8>,
    /// The leaf index in the tree.
    pub leaf_index: u64,
}

impl MerkleProof {
    /// Fold the leaf up through the siblings and check the result against
    /// the proof's root.
    pub fn verify(&self, leaf: B256) -> bool {
        self.compute_root(leaf) == self.root
    }

    /// Recompute the root implied by this path for the given leaf.
    pub fn compute_root(&self, leaf: B256) -> B256 {
        let mut current = leaf;
        for (sibling, bit) in self.siblings.iter().zip(&self.indices) {
            current = if *bit == 0 {
                poseidon2(current, *sibling)
            } else {
                poseidon2(*sibling, current)
            };
        }
        current
    }
}
