use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::Address;
use serde::Deserialize;

use crate::domain::tree::{
    DEFAULT_TREE_DEPTH,
    MAX_TREE_DEPTH,
};

/// Top-level pool configuration loaded from TOML.
#[derive(Debug, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub tree: TreeConfig,
    pub ledger: LedgerConfig,
    pub verification: VerificationConfig,
    pub proofs: ProofsConfig,
}

/// Commitment-tree parameters.
#[derive(Debug, Deserialize)]
pub struct TreeConfig {
    pub depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_TREE_DEPTH,
        }
    }
}

/// On-chain ledger connection.
#[derive(Debug, Deserialize)]
pub struct LedgerConfig {
    pub rpc_url: String,
    /// Deployed mixer contract address.
    pub mixer_address: Address,
    /// Block at which the mixer was deployed; reconciliation scans no
    /// earlier than this.
    pub deployment_block: u64,
}

/// Which verification backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationProviderKind {
    Remote,
    Static,
}

impl std::fmt::Display for VerificationProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Static => write!(f, "static"),
        }
    }
}

/// Verification provider configuration.
#[derive(Debug, Deserialize)]
pub struct VerificationConfig {
    pub provider: VerificationProviderKind,
    /// Base URL of the remote verification API. Required for the remote
    /// provider.
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    /// Cache freshness window (e.g. "5m"). Parsed via humantime.
    #[serde(default = "default_cache_ttl", with = "humantime_serde")]
    pub cache_ttl: Duration,
}

fn default_cache_ttl() -> Duration {
    crate::verification::DEFAULT_CACHE_TTL
}

/// Which proof backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofProviderKind {
    Circuit,
    Mock,
}

impl std::fmt::Display for ProofProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Circuit => write!(f, "circuit"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

/// Proof provider configuration.
#[derive(Debug, Deserialize)]
pub struct ProofsConfig {
    pub provider: ProofProviderKind,
    /// Directory holding circuit manifests. Required for the circuit
    /// provider.
    pub circuits_dir: Option<PathBuf>,
}

/// Errors from config loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl PoolConfig {
    /// Load and validate a config from a TOML file.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tree.depth == 0 || self.tree.depth > MAX_TREE_DEPTH {
            return Err(ConfigError::Validation(format!(
                "tree.depth must be between 1 and {MAX_TREE_DEPTH}, got {}",
                self.tree.depth
            )));
        }

        if self.verification.provider == VerificationProviderKind::Remote
            && self.verification.api_url.is_none()
        {
            return Err(ConfigError::Validation(
                "verification.api_url required for the remote provider".into(),
            ));
        }

        if self.proofs.provider == ProofProviderKind::Circuit
            && self.proofs.circuits_dir.is_none()
        {
            return Err(ConfigError::Validation(
                "proofs.circuits_dir required for the circuit provider".into(),
            ));
        }

        Ok(())
    }
}
