use std::collections::BTreeMap;

use alloy::primitives::{
    keccak256,
    Bytes,
    B256,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Request for a proof of one circuit's statement.
///
/// Private inputs are passed to the provider and nowhere else: they must
/// never appear in a log line, error message, or persisted record. The
/// `Debug` impl below enforces that by printing private-input keys only.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkProofInput {
    pub circuit_id: String,
    pub private_inputs: BTreeMap<String, String>,
    pub public_inputs: BTreeMap<String, String>,
}

impl std::fmt::Debug for ZkProofInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZkProofInput")
            .field("circuit_id", &self.circuit_id)
            .field(
                "private_inputs",
                &self.private_inputs.keys().collect::<Vec<_>>(),
            )
            .field("public_inputs", &self.public_inputs)
            .finish()
    }
}

impl ZkProofInput {
    /// Public-input values in key order; these become the proof's public
    /// signals.
    pub fn public_signals(&self) -> Vec<String> {
        self.public_inputs.values().cloned().collect()
    }

    /// Derive the deterministic proof artifact for this input.
    ///
    /// The "proof" is the system's existing stand-in: a hash binding over
    /// the full input next to a commitment over the public part. Verifiers
    /// can recheck the public commitment, but the binding is only
    /// recomputable by whoever holds the private inputs — it is not a
    /// succinct zero-knowledge proof.
    pub fn derive_proof(&self, generated_at: u64) -> ZkProof {
        let seal = ProofSeal {
            binding: self.binding(),
            public_commitment: public_commitment(&self.circuit_id, &self.public_signals()),
        };
        ZkProof {
            proof: serde_json::to_vec(&seal)
                .expect("proof seal serialization cannot fail")
                .into(),
            public_signals: self.public_signals(),
            circuit_id: self.circuit_id.clone(),
            generated_at,
        }
    }

    /// Hash binding over circuit id and every input, private ones included.
    /// The digest reveals nothing, but it is what makes the proof
    /// input-specific.
    fn binding(&self) -> B256 {
        let mut preimage = Vec::new();
        absorb(&mut preimage, self.circuit_id.as_bytes());
        for (key, value) in self.private_inputs.iter().chain(&self.public_inputs) {
            absorb(&mut preimage, key.as_bytes());
            absorb(&mut preimage, value.as_bytes());
        }
        keccak256(&preimage)
    }
}

/// The two digests serialized into the proof bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofSeal {
    pub binding: B256,
    pub public_commitment: B256,
}

/// Commitment over the circuit id and public signals; the part a verifier
/// can recompute without the private inputs.
pub fn public_commitment(circuit_id: &str, public_signals: &[String]) -> B256 {
    let mut preimage = Vec::new();
    absorb(&mut preimage, circuit_id.as_bytes());
    for signal in public_signals {
        absorb(&mut preimage, signal.as_bytes());
    }
    keccak256(&preimage)
}

/// Length-prefix each part so adjacent fields cannot be reassociated.
fn absorb(preimage: &mut Vec<u8>, part: &[u8]) {
    preimage.extend_from_slice(&(part.len() as u64).to_be_bytes());
    preimage.extend_from_slice(part);
}

/// A generated proof plus its public signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkProof {
    pub proof: Bytes,
    /// Public signals in input-key order.
    pub public_signals: Vec<String>,
    pub circuit_id: String,
    /// Unix timestamp of generation.
    pub generated_at: u64,
}

/// Outcome of verifying a proof. Invalid proofs are a result, not an error;
/// errors are reserved for the backend being unable to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofVerification {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl ProofVerification {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> ZkProofInput {
        let mut private_inputs = BTreeMap::new();
        private_inputs.insert("threshold".to_string(), "5000".to_string());
        let mut public_inputs = BTreeMap::new();
        public_inputs.insert("current_price".to_string(), "4200".to_string());
        public_inputs.insert("result".to_string(), "true".to_string());
        ZkProofInput {
            circuit_id: "price_condition".to_string(),
            private_inputs,
            public_inputs,
        }
    }

    #[test]
    fn test_derive_proof_deterministic() {
        let input = sample_input();
        let proof1 = input.derive_proof(1_000);
        let proof2 = input.derive_proof(2_000);
        assert_eq!(proof1.proof, proof2.proof);
        assert_eq!(proof1.public_signals, vec!["4200", "true"]);
    }

    #[test]
    fn test_private_input_changes_binding_not_signals() {
        let input = sample_input();
        let mut other = input.clone();
        other
            .private_inputs
            .insert("threshold".to_string(), "9999".to_string());

        let p1 = input.derive_proof(0);
        let p2 = other.derive_proof(0);
        assert_ne!(p1.proof, p2.proof);
        assert_eq!(p1.public_signals, p2.public_signals);
    }

    #[test]
    fn test_public_commitment_recomputable_from_proof() {
        let input = sample_input();
        let proof = input.derive_proof(0);
        let seal: ProofSeal = serde_json::from_slice(&proof.proof).unwrap();
        assert_eq!(
            seal.public_commitment,
            public_commitment(&proof.circuit_id, &proof.public_signals)
        );
    }

    #[test]
    fn test_debug_hides_private_values() {
        let mut private_inputs = BTreeMap::new();
        private_inputs.insert("threshold".to_string(), "123456789".to_string());
        let mut public_inputs = BTreeMap::new();
        public_inputs.insert("current_price".to_string(), "42".to_string());

        let input = ZkProofInput {
            circuit_id: "price_condition".to_string(),
            private_inputs,
            public_inputs,
        };

        let rendered = format!("{input:?}");
        assert!(rendered.contains("threshold"), "keys may be shown");
        assert!(!rendered.contains("123456789"), "values must not leak");
        assert!(rendered.contains("current_price"));
        assert!(rendered.contains("42"), "public values are fine");
    }
}
