use alloy::primitives::B256;
use ark_bn254::Fr;
use ark_ff::{
    BigInteger,
    PrimeField,
};
use light_poseidon::{
    Poseidon,
    PoseidonHasher,
};
use rand::Rng;

/// Convert B256 to a BN254 field element (big-endian bytes mod order).
pub fn b256_to_fr(value: B256) -> Fr {
    Fr::from_be_bytes_mod_order(value.as_ref())
}

/// Convert a BN254 field element back to B256.
pub fn fr_to_b256(value: Fr) -> B256 {
    let big_int = value.into_bigint();
    let bytes = big_int.to_bytes_be();
    B256::from_slice(&bytes)
}

/// Reduce an arbitrary 32-byte value into the field and re-encode it.
/// Used to derive canonical constants (e.g. the empty-leaf value) from
/// keccak digests.
pub fn reduce_to_field(value: B256) -> B256 {
    fr_to_b256(b256_to_fr(value))
}

/// Pairwise Poseidon hash with the Circom-compatible configuration.
///
/// This is the single hash `H` the pool is built on. Domain separation is
/// structural:
/// - commitment     = H(nullifier, secret)
/// - nullifier hash = H(nullifier, nullifier)
/// - tree node      = H(left, right)
pub fn poseidon2(a: B256, b: B256) -> B256 {
    let mut hasher =
        Poseidon::<Fr>::new_circom(2).expect("Failed to create Poseidon hasher");
    let inputs = [b256_to_fr(a), b256_to_fr(b)];
    let result = hasher
        .hash(&inputs)
        .expect("Failed to compute Poseidon hash");
    fr_to_b256(result)
}

/// Draw a random 256-bit value that is guaranteed to fit in the field.
/// The top five bytes stay zero, same trick the note salts use.
pub fn random_field_element() -> B256 {
    let mut rng = rand::thread_rng();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes[5..]);
    B256::from(bytes)
}
