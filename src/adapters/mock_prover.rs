use crate::adapters::circuit_prover::unix_now;
use crate::domain::zkproof::{
    public_commitment,
    ProofSeal,
    ProofVerification,
    ZkProof,
    ZkProofInput,
};
use crate::ports::prover::{
    ProofProvider,
    ProverError,
};

/// The circuits the mock backend pretends to carry.
const BUILTIN_CIRCUITS: &[&str] = &["price_condition", "private_transfer"];

/// In-memory proof backend for tests and local development. No filesystem,
/// no artifacts; same deterministic proof construction as the circuit
/// backend so proofs verify across a provider swap.
#[derive(Debug, Default)]
pub struct MockProver;

impl MockProver {
    pub fn new() -> Self {
        Self
    }

    fn require_circuit(circuit_id: &str) -> Result<(), ProverError> {
        if BUILTIN_CIRCUITS.contains(&circuit_id) {
            Ok(())
        } else {
            Err(ProverError::CircuitNotFound(circuit_id.to_string()))
        }
    }
}

impl ProofProvider for MockProver {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate_proof(&self, input: &ZkProofInput) -> Result<ZkProof, ProverError> {
        Self::require_circuit(&input.circuit_id)?;
        Ok(input.derive_proof(unix_now()))
    }

    async fn verify_proof(&self, proof: &ZkProof) -> Result<ProofVerification, ProverError> {
        Self::require_circuit(&proof.circuit_id)?;

        let seal: ProofSeal = serde_json::from_slice(&proof.proof)
            .map_err(|e| ProverError::SerializationError(e.to_string()))?;
        let expected = public_commitment(&proof.circuit_id, &proof.public_signals);
        if seal.public_commitment == expected {
            Ok(ProofVerification::valid())
        } else {
            Ok(ProofVerification::invalid(
                "public commitment does not match public signals",
            ))
        }
    }

    async fn list_circuits(&self) -> Result<Vec<String>, ProverError> {
        Ok(BUILTIN_CIRCUITS.iter().map(|c| c.to_string()).collect())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn transfer_input() -> ZkProofInput {
        let mut private_inputs = BTreeMap::new();
        private_inputs.insert("secret".to_string(), "0xdeadbeef".to_string());
        let mut public_inputs = BTreeMap::new();
        public_inputs.insert("nullifier_hash".to_string(), "0x01".to_string());
        ZkProofInput {
            circuit_id: "private_transfer".to_string(),
            private_inputs,
            public_inputs,
        }
    }

    #[tokio::test]
    async fn test_builtin_circuits_only() {
        let prover = MockProver::new();
        assert_eq!(
            prover.list_circuits().await.unwrap(),
            vec!["price_condition", "private_transfer"]
        );

        let mut input = transfer_input();
        input.circuit_id = "unknown_circuit".to_string();
        assert!(matches!(
            prover.generate_proof(&input).await.unwrap_err(),
            ProverError::CircuitNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_prove_verify_roundtrip() {
        let prover = MockProver::new();
        let proof = prover.generate_proof(&transfer_input()).await.unwrap();
        assert!(prover.verify_proof(&proof).await.unwrap().is_valid);
    }

    #[tokio::test]
    async fn test_deterministic_across_calls() {
        let prover = MockProver::new();
        let input = transfer_input();
        let p1 = prover.generate_proof(&input).await.unwrap();
        let p2 = prover.generate_proof(&input).await.unwrap();
        assert_eq!(p1.proof, p2.proof);
        assert_eq!(p1.public_signals, p2.public_signals);
    }
}
