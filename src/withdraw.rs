use alloy::primitives::{
    Address,
    B256,
    U256,
};
use thiserror::Error;

use crate::crypto::poseidon::poseidon2;
use crate::domain::note::DepositNote;
use crate::domain::proof::{
    WithdrawalPayload,
    WithdrawalProof,
    WithdrawalPublicInputs,
};
use crate::pool::{
    CommitmentPool,
    PoolError,
};

/// Errors from withdrawal proof construction. All checks are local; nothing
/// here touches the ledger.
#[derive(Debug, Error)]
pub enum WithdrawError {
    #[error("leaf {leaf_index} does not hold the note's commitment")]
    CommitmentMismatch { leaf_index: u64 },

    #[error("recipient must not be the zero address")]
    ZeroRecipient,

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Build a withdrawal proof for a deposited note against the pool's current
/// root.
///
/// The proof binds root, nullifier hash, recipient, relayer, and fee into a
/// single digest, so none of them can be swapped after the fact; a zero
/// relayer with zero fee means self-withdrawal. The note's secrets feed the
/// nullifier hash but never appear in the output.
pub fn build_withdrawal_proof(
    pool: &CommitmentPool,
    note: &DepositNote,
    leaf_index: u64,
    recipient: Address,
    relayer: Address,
    fee: U256,
) -> Result<WithdrawalProof, WithdrawError> {
    if recipient == Address::ZERO {
        return Err(WithdrawError::ZeroRecipient);
    }

    // The note must actually sit in the tree where the caller claims.
    let merkle_proof = pool.proof(leaf_index)?;
    if pool.leaf(leaf_index) != note.commitment {
        return Err(WithdrawError::CommitmentMismatch { leaf_index });
    }

    let public_inputs = WithdrawalPublicInputs {
        root: merkle_proof.root,
        nullifier_hash: note.nullifier_hash,
        recipient,
        relayer,
        fee,
    };

    let payload = WithdrawalPayload {
        binding: binding_digest(&public_inputs),
        siblings: merkle_proof.siblings,
        indices: merkle_proof.indices,
    };

    tracing::debug!(
        leaf_index,
        root = %public_inputs.root,
        nullifier_hash = %public_inputs.nullifier_hash,
        "built withdrawal proof"
    );

    Ok(WithdrawalProof {
        proof: payload.encode(),
        public_inputs,
    })
}

/// Fold all five public inputs into one digest. Recomputable by any party
/// holding the public inputs, which is what lets a verifier check the
/// payload matches the call it arrived in.
pub fn binding_digest(inputs: &WithdrawalPublicInputs) -> B256 {
    let h = poseidon2(inputs.root, inputs.nullifier_hash);
    let h = poseidon2(h, B256::left_padding_from(inputs.recipient.as_slice()));
    let h = poseidon2(h, B256::left_padding_from(inputs.relayer.as_slice()));
    poseidon2(h, B256::from(inputs.fee))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_with_note() -> (CommitmentPool, DepositNote) {
        let mut pool = CommitmentPool::new(8, 0).unwrap();
        let mut note = pool.generate_note();
        pool.record_deposit(note.commitment, 0, B256::repeat_byte(0xaa))
            .unwrap();
        note.mark_deposited(0, B256::repeat_byte(0xaa));
        (pool, note)
    }

    #[test]
    fn test_withdrawal_proof_binds_public_inputs() {
        let (pool, note) = pool_with_note();
        let recipient = Address::repeat_byte(0x01);

        let proof =
            build_withdrawal_proof(&pool, &note, 0, recipient, Address::ZERO, U256::ZERO)
                .unwrap();

        assert_eq!(proof.public_inputs.root, pool.root());
        assert_eq!(proof.public_inputs.nullifier_hash, note.nullifier_hash);

        let payload = proof.payload().unwrap();
        assert_eq!(payload.binding, binding_digest(&proof.public_inputs));

        // The Merkle path inside the payload recomputes the bound root.
        let merkle = pool.proof(0).unwrap();
        assert_eq!(payload.siblings, merkle.siblings);
    }

    #[test]
    fn test_fee_changes_binding() {
        let (pool, note) = pool_with_note();
        let recipient = Address::repeat_byte(0x01);
        let relayer = Address::repeat_byte(0x02);

        let p1 =
            build_withdrawal_proof(&pool, &note, 0, recipient, relayer, U256::from(1u64))
                .unwrap();
        let p2 =
            build_withdrawal_proof(&pool, &note, 0, recipient, relayer, U256::from(2u64))
                .unwrap();
        assert_ne!(
            p1.payload().unwrap().binding,
            p2.payload().unwrap().binding
        );
    }

    #[test]
    fn test_unrecorded_leaf_rejected() {
        let (pool, note) = pool_with_note();
        let err = build_withdrawal_proof(
            &pool,
            &note,
            5,
            Address::repeat_byte(0x01),
            Address::ZERO,
            U256::ZERO,
        )
        .unwrap_err();
        assert!(matches!(err, WithdrawError::Pool(_)));
    }

    #[test]
    fn test_zero_recipient_rejected() {
        let (pool, note) = pool_with_note();
        let err = build_withdrawal_proof(
            &pool,
            &note,
            0,
            Address::ZERO,
            Address::ZERO,
            U256::ZERO,
        )
        .unwrap_err();
        assert!(matches!(err, WithdrawError::ZeroRecipient));
    }

    #[test]
    fn test_commitment_mismatch_rejected() {
        let (mut pool, note) = pool_with_note();
        // Another deposit overwrites the note's slot.
        pool.record_deposit(B256::repeat_byte(0x99), 0, B256::ZERO)
            .unwrap();

        let err = build_withdrawal_proof(
            &pool,
            &note,
            0,
            Address::repeat_byte(0x01),
            Address::ZERO,
            U256::ZERO,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            WithdrawError::CommitmentMismatch { leaf_index: 0 }
        ));
    }
}
