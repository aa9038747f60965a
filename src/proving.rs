use std::collections::BTreeMap;
use std::collections::HashMap;

use alloy::primitives::{
    keccak256,
    B256,
};
use tokio::sync::Mutex;

use crate::adapters::circuit_prover::CircuitProver;
use crate::adapters::mock_prover::MockProver;
use crate::domain::zkproof::{
    ProofVerification,
    ZkProof,
    ZkProofInput,
};
use crate::ports::prover::{
    ProofProvider,
    ProverError,
};

/// The proof backends the service can run on. Same closed-sum shape as
/// [`crate::verification::VerificationBackend`], for the same reason.
pub enum ProofBackend {
    Circuit(CircuitProver),
    Mock(MockProver),
}

impl ProofBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Circuit(p) => p.name(),
            Self::Mock(p) => p.name(),
        }
    }

    async fn generate_proof(&self, input: &ZkProofInput) -> Result<ZkProof, ProverError> {
        match self {
            Self::Circuit(p) => p.generate_proof(input).await,
            Self::Mock(p) => p.generate_proof(input).await,
        }
    }

    async fn verify_proof(&self, proof: &ZkProof) -> Result<ProofVerification, ProverError> {
        match self {
            Self::Circuit(p) => p.verify_proof(proof).await,
            Self::Mock(p) => p.verify_proof(proof).await,
        }
    }

    async fn list_circuits(&self) -> Result<Vec<String>, ProverError> {
        match self {
            Self::Circuit(p) => p.list_circuits().await,
            Self::Mock(p) => p.list_circuits().await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            Self::Circuit(p) => p.health_check().await,
            Self::Mock(p) => p.health_check().await,
        }
    }
}

struct ServiceState {
    backend: ProofBackend,
    cache: HashMap<B256, ZkProof>,
}

/// Proof-generation facade with a proof cache over the active backend.
///
/// Unlike verification, proving is never fail-open: a proof the backend
/// could not produce is an error the caller must see, because a missing or
/// wrong proof spends funds nowhere.
pub struct ProofService {
    state: Mutex<ServiceState>,
}

impl ProofService {
    pub fn new(backend: ProofBackend) -> Self {
        Self {
            state: Mutex::new(ServiceState {
                backend,
                cache: HashMap::new(),
            }),
        }
    }

    pub async fn provider_name(&self) -> &'static str {
        self.state.lock().await.backend.name()
    }

    /// Generate a proof, reusing a cached one for an identical input.
    /// Proof derivation is deterministic per input, so a cache hit is
    /// indistinguishable from regeneration.
    pub async fn generate_proof(&self, input: &ZkProofInput) -> Result<ZkProof, ProverError> {
        let key = cache_key(input)?;
        let mut state = self.state.lock().await;

        if let Some(proof) = state.cache.get(&key) {
            tracing::debug!(circuit_id = %input.circuit_id, "proof cache hit");
            return Ok(proof.clone());
        }

        let proof = state.backend.generate_proof(input).await?;
        state.cache.insert(key, proof.clone());
        Ok(proof)
    }

    pub async fn verify_proof(&self, proof: &ZkProof) -> Result<ProofVerification, ProverError> {
        self.state.lock().await.backend.verify_proof(proof).await
    }

    pub async fn list_circuits(&self) -> Result<Vec<String>, ProverError> {
        self.state.lock().await.backend.list_circuits().await
    }

    pub async fn health_check(&self) -> bool {
        self.state.lock().await.backend.health_check().await
    }

    /// Replace the active backend, dropping every cached proof in the same
    /// critical section. Always logged.
    pub async fn swap_provider(&self, new_backend: ProofBackend) {
        let mut state = self.state.lock().await;
        let old_name = state.backend.name();
        let new_name = new_backend.name();
        let evicted = state.cache.len();
        state.backend = new_backend;
        state.cache.clear();
        tracing::warn!(
            old_provider = old_name,
            new_provider = new_name,
            evicted_proofs = evicted,
            "proof provider swapped, cache cleared"
        );
    }
}

/// Cache key over the full input. BTreeMap serialization is ordered, so
/// equal inputs always hash equally.
fn cache_key(input: &ZkProofInput) -> Result<B256, ProverError> {
    let encoded = serde_json::to_vec(input)
        .map_err(|e| ProverError::SerializationError(e.to_string()))?;
    Ok(keccak256(&encoded))
}

/// Input for the price-condition circuit: proves the private threshold
/// relation for a public price without revealing the threshold.
pub fn price_condition_input(
    intent_id: &str,
    current_price: u64,
    threshold: u64,
) -> ZkProofInput {
    let mut private_inputs = BTreeMap::new();
    private_inputs.insert("threshold".to_string(), threshold.to_string());

    let mut public_inputs = BTreeMap::new();
    public_inputs.insert("current_price".to_string(), current_price.to_string());
    public_inputs.insert(
        "intent_hash".to_string(),
        keccak256(intent_id.as_bytes()).to_string(),
    );
    public_inputs.insert(
        "condition_met".to_string(),
        (current_price < threshold).to_string(),
    );

    ZkProofInput {
        circuit_id: "price_condition".to_string(),
        private_inputs,
        public_inputs,
    }
}

/// Input for the private-transfer circuit. Only the nullifier hash and a
/// binding over the transfer tuple go public; amount, secret, and recipient
/// stay private.
pub fn private_transfer_input(
    secret: B256,
    nullifier_hash: B256,
    recipient: alloy::primitives::Address,
    amount: alloy::primitives::U256,
) -> ZkProofInput {
    let mut private_inputs = BTreeMap::new();
    private_inputs.insert("secret".to_string(), secret.to_string());
    private_inputs.insert("recipient".to_string(), recipient.to_string());
    private_inputs.insert("amount".to_string(), amount.to_string());

    let mut transfer_preimage = Vec::new();
    transfer_preimage.extend_from_slice(secret.as_slice());
    transfer_preimage.extend_from_slice(recipient.as_slice());
    transfer_preimage.extend_from_slice(&amount.to_be_bytes::<32>());

    let mut public_inputs = BTreeMap::new();
    public_inputs.insert("nullifier_hash".to_string(), nullifier_hash.to_string());
    public_inputs.insert(
        "transfer_binding".to_string(),
        keccak256(&transfer_preimage).to_string(),
    );

    ZkProofInput {
        circuit_id: "private_transfer".to_string(),
        private_inputs,
        public_inputs,
    }
}
