use alloy::primitives::B256;
use serde::{
    Deserialize,
    Serialize,
};

use crate::crypto::poseidon::{
    poseidon2,
    random_field_element,
};

/// A deposit note is the secret bundle that proves ownership of one
/// fixed-denomination deposit in the pool.
///
/// The pool only ever publishes `commitment`; `nullifier` and `secret` stay
/// with whoever generated the note. The nullifier hash is revealed on
/// withdrawal so the ledger can mark the note spent without learning which
/// deposit it came from.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositNote {
    /// Spend-once secret, random field element.
    pub nullifier: B256,
    /// Blinding secret, random field element.
    pub secret: B256,
    /// commitment = H(nullifier, secret)
    pub commitment: B256,
    /// nullifier_hash = H(nullifier, nullifier)
    pub nullifier_hash: B256,
    /// Position assigned by the ledger once deposited.
    pub leaf_index: Option<u64>,
    /// Transaction that recorded the deposit.
    pub deposit_tx: Option<B256>,
}

impl DepositNote {
    /// Generate a fresh note from two independent random field elements.
    pub fn generate() -> Self {
        Self::from_secrets(random_field_element(), random_field_element())
    }

    /// Reconstruct a note from known secrets. Derivation is pure: the same
    /// `(nullifier, secret)` pair always reproduces the same commitment and
    /// nullifier hash.
    pub fn from_secrets(nullifier: B256, secret: B256) -> Self {
        Self {
            nullifier,
            secret,
            commitment: commitment_for(nullifier, secret),
            nullifier_hash: nullifier_hash_for(nullifier),
            leaf_index: None,
            deposit_tx: None,
        }
    }

    /// Record the ledger-assigned position after the deposit confirms.
    pub fn mark_deposited(&mut self, leaf_index: u64, tx_hash: B256) {
        self.leaf_index = Some(leaf_index);
        self.deposit_tx = Some(tx_hash);
    }
}

/// commitment = H(nullifier, secret)
pub fn commitment_for(nullifier: B256, secret: B256) -> B256 {
    poseidon2(nullifier, secret)
}

/// nullifier_hash = H(nullifier, nullifier)
pub fn nullifier_hash_for(nullifier: B256) -> B256 {
    poseidon2(nullifier, nullifier)
}

// The secrets must never leak through logs; Debug shows only the public
// parts of the note.
impl std::fmt::Debug for DepositNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepositNote")
            .field("nullifier", &"<redacted>")
            .field("secret", &"<redacted>")
            .field("commitment", &self.commitment)
            .field("nullifier_hash", &self.nullifier_hash)
            .field("leaf_index", &self.leaf_index)
            .field("deposit_tx", &self.deposit_tx)
            .finish()
    }
}
