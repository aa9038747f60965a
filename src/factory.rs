//! Provider construction from configuration. Pure wiring: nothing here
//! performs network or filesystem I/O, so building a context is cheap and
//! infallible once the config has validated.

use std::path::PathBuf;

use crate::adapters::circuit_prover::CircuitProver;
use crate::adapters::mock_prover::MockProver;
use crate::adapters::remote_verification::RemoteVerification;
use crate::adapters::static_verification::StaticVerification;
use crate::config::{
    PoolConfig,
    ProofProviderKind,
    VerificationProviderKind,
};
use crate::proving::ProofBackend;
use crate::verification::VerificationBackend;

/// Build the verification backend the config names.
pub fn build_verification_backend(config: &PoolConfig) -> VerificationBackend {
    match config.verification.provider {
        VerificationProviderKind::Remote => {
            // validate() guarantees api_url is present for the remote kind.
            let api_url = config.verification.api_url.clone().unwrap_or_default();
            VerificationBackend::Remote(RemoteVerification::new(
                api_url,
                config.verification.api_key.clone(),
            ))
        }
        VerificationProviderKind::Static => {
            VerificationBackend::Static(StaticVerification::empty())
        }
    }
}

/// Build the proof backend the config names.
pub fn build_proof_backend(config: &PoolConfig) -> ProofBackend {
    match config.proofs.provider {
        ProofProviderKind::Circuit => {
            // validate() guarantees circuits_dir is present for the circuit kind.
            let dir = config
                .proofs
                .circuits_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("circuits"));
            ProofBackend::Circuit(CircuitProver::new(dir))
        }
        ProofProviderKind::Mock => ProofBackend::Mock(MockProver::new()),
    }
}
