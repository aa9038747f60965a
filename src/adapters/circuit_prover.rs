use std::path::{
    Path,
    PathBuf,
};
use std::time::{
    SystemTime,
    UNIX_EPOCH,
};

use serde::Deserialize;

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

/// Per-circuit manifest, `<circuits_dir>/<circuit_id>/circuit.json`.
///
/// Declares which inputs the circuit expects; proving rejects requests that
/// do not supply all of them.
#[derive(Debug, Clone, Deserialize)]
struct CircuitManifest {
    #[serde(rename = "circuitId")]
    circuit_id: String,
    #[serde(rename = "publicInputs")]
    public_inputs: Vec<String>,
    #[serde(rename = "privateInputs")]
    private_inputs: Vec<String>,
}

/// Proof backend that loads circuit artifacts from a configured directory.
///
/// Proof construction itself is the deterministic binding documented on
/// [`ZkProofInput::derive_proof`]; the artifact layout and input validation
/// are what a real proving backend would keep.
pub struct CircuitProver {
    circuits_dir: PathBuf,
}

impl CircuitProver {
    pub fn new(circuits_dir: PathBuf) -> Self {
        Self { circuits_dir }
    }

    fn manifest_path(&self, circuit_id: &str) -> PathBuf {
        self.circuits_dir.join(circuit_id).join("circuit.json")
    }

    fn load_manifest(&self, circuit_id: &str) -> Result<CircuitManifest, ProverError> {
        let path = self.manifest_path(circuit_id);
        if !path.exists() {
            return Err(ProverError::CircuitNotFound(circuit_id.to_string()));
        }
        let raw = std::fs::read_to_string(&path)?;
        let manifest: CircuitManifest = serde_json::from_str(&raw)
            .map_err(|e| ProverError::SerializationError(e.to_string()))?;
        if manifest.circuit_id != circuit_id {
            return Err(ProverError::SerializationError(format!(
                "manifest at {} declares circuit {}, expected {}",
                path.display(),
                manifest.circuit_id,
                circuit_id
            )));
        }
        Ok(manifest)
    }

    /// Every input the manifest declares must be supplied. Error messages
    /// name input keys only, never values.
    fn check_inputs(
        manifest: &CircuitManifest,
        input: &ZkProofInput,
    ) -> Result<(), ProverError> {
        for name in &manifest.public_inputs {
            if !input.public_inputs.contains_key(name) {
                return Err(ProverError::MissingInput {
                    circuit_id: manifest.circuit_id.clone(),
                    input: name.clone(),
                });
            }
        }
        for name in &manifest.private_inputs {
            if !input.private_inputs.contains_key(name) {
                return Err(ProverError::MissingInput {
                    circuit_id: manifest.circuit_id.clone(),
                    input: name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl ProofProvider for CircuitProver {
    fn name(&self) -> &'static str {
        "circuit"
    }

    async fn generate_proof(&self, input: &ZkProofInput) -> Result<ZkProof, ProverError> {
        let manifest = self.load_manifest(&input.circuit_id)?;
        Self::check_inputs(&manifest, input)?;

        let generated_at = unix_now();
        tracing::debug!(
            circuit_id = %input.circuit_id,
            public_inputs = ?input.public_inputs.keys().collect::<Vec<_>>(),
            "generating proof"
        );
        Ok(input.derive_proof(generated_at))
    }

    async fn verify_proof(&self, proof: &ZkProof) -> Result<ProofVerification, ProverError> {
        // Verification only needs the circuit to exist and the public
        // commitment to match the claimed signals.
        self.load_manifest(&proof.circuit_id)?;

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
        let mut circuits = Vec::new();
        for entry in std::fs::read_dir(&self.circuits_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            if entry.path().join("circuit.json").exists() {
                circuits.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        circuits.sort();
        Ok(circuits)
    }

    async fn health_check(&self) -> bool {
        self.circuits_dir.is_dir()
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Write a manifest for tests and local setups.
pub fn write_manifest(
    circuits_dir: &Path,
    circuit_id: &str,
    public_inputs: &[&str],
    private_inputs: &[&str],
) -> std::io::Result<()> {
    let dir = circuits_dir.join(circuit_id);
    std::fs::create_dir_all(&dir)?;
    let manifest = serde_json::json!({
        "circuitId": circuit_id,
        "publicInputs": public_inputs,
        "privateInputs": private_inputs,
    });
    std::fs::write(dir.join("circuit.json"), manifest.to_string())
}
