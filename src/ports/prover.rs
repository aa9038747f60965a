use thiserror::Error;

use crate::domain::zkproof::{
    ProofVerification,
    ZkProof,
    ZkProofInput,
};

/// Errors from proof-generation providers.
///
/// Unlike verification errors these propagate to the caller: a missing or
/// invalid proof can never be downgraded to "valid".
#[derive(Debug, Error)]
pub enum ProverError {
    #[error("circuit not found: {0}")]
    CircuitNotFound(String),

    #[error("missing input for circuit {circuit_id}: {input}")]
    MissingInput { circuit_id: String, input: String },

    #[error("proof generation failed: {0}")]
    ProofGenerationError(String),

    #[error("proof verification failed: {0}")]
    VerificationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Capability interface for producing and verifying zero-knowledge-style
/// proofs of auxiliary conditions (price comparisons, private transfers).
pub trait ProofProvider: Send + Sync {
    /// Stable provider identity, recorded in swap audit events.
    fn name(&self) -> &'static str;

    /// Generate a proof. Private inputs are consumed here and must not be
    /// logged or persisted by any implementation.
    fn generate_proof(
        &self,
        input: &ZkProofInput,
    ) -> impl core::future::Future<Output = Result<ZkProof, ProverError>>;

    /// Verify a previously generated proof.
    fn verify_proof(
        &self,
        proof: &ZkProof,
    ) -> impl core::future::Future<Output = Result<ProofVerification, ProverError>>;

    /// Identifiers of the circuits this provider can prove.
    fn list_circuits(
        &self,
    ) -> impl core::future::Future<Output = Result<Vec<String>, ProverError>>;

    /// Whether the backend can currently prove.
    fn health_check(&self) -> impl core::future::Future<Output = bool>;
}
