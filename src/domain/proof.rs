use alloy::primitives::{
    Address,
    Bytes,
    B256,
    U256,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Public inputs of a withdrawal, checked by the on-chain mixer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalPublicInputs {
    /// Merkle root the path was generated against. Must still be in the
    /// ledger's bounded root history when submitted.
    pub root: B256,
    /// Published so the ledger can mark the note spent.
    pub nullifier_hash: B256,
    pub recipient: Address,
    pub relayer: Address,
    pub fee: U256,
}

/// Payload serialized into the withdrawal proof bytes.
///
/// The binding is a hash commitment over the public inputs, and the Merkle
/// path travels in the clear. This is NOT a zero-knowledge membership proof:
/// anyone inspecting the payload can link the withdrawal to its leaf. A
/// privacy-preserving deployment must replace this with a succinct circuit
/// proof of path membership and nullifier derivation; the circuit definition
/// lives outside this crate, so the construction is kept as-is rather than
/// silently redesigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalPayload {
    /// binding = H(H(H(H(root, nullifier_hash), recipient), relayer), fee)
    pub binding: B256,
    /// Sibling hashes, leaf to root.
    pub siblings: Vec<B256>,
    /// Left/right bits per level.
    pub indices: Vec<u8>,
}

impl WithdrawalPayload {
    /// Serialize into the proof-bytes wire form.
    pub fn encode(&self) -> Bytes {
        serde_json::to_vec(self)
            .expect("withdrawal payload serialization cannot fail")
            .into()
    }
}

/// The artifact submitted to the ledger for one withdrawal attempt.
///
/// The builder is stateless about spend status: whether the nullifier hash
/// is unspent and the root still recognized is the ledger's call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalProof {
    /// Serialized `WithdrawalPayload`.
    pub proof: Bytes,
    pub public_inputs: WithdrawalPublicInputs,
}

impl WithdrawalProof {
    /// Decode the payload back out of the proof bytes.
    pub fn payload(&self) -> Result<WithdrawalPayload, serde_json::Error> {
        serde_json::from_slice(&self.proof)
    }
}
