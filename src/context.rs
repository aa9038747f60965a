use crate::config::{
    ConfigError,
    PoolConfig,
};
use crate::factory::{
    build_proof_backend,
    build_verification_backend,
};
use crate::pool::{
    CommitmentPool,
    PoolError,
};
use crate::proving::ProofService;
use crate::verification::VerificationService;

/// Everything a pool deployment runs on, built once from config and passed
/// down by reference. Provider swaps go through the services, so holders of
/// the context never rebind these fields.
pub struct PoolContext {
    pub pool: CommitmentPool,
    pub verification: VerificationService,
    pub proofs: ProofService,
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl PoolContext {
    /// Assemble a context from a validated config.
    pub fn from_config(config: &PoolConfig) -> Result<Self, ContextError> {
        config.validate()?;
        let pool = CommitmentPool::new(config.tree.depth, config.ledger.deployment_block)?;
        let verification = VerificationService::new(
            build_verification_backend(config),
            config.verification.cache_ttl,
        );
        let proofs = ProofService::new(build_proof_backend(config));

        tracing::info!(
            tree_depth = config.tree.depth,
            verification_provider = %config.verification.provider,
            proof_provider = %config.proofs.provider,
            "pool context assembled"
        );
        Ok(Self {
            pool,
            verification,
            proofs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_context_from_config() {
        let toml = r#"
[tree]
depth = 12

[ledger]
rpc_url = "https://rpc.sepolia.org"
mixer_address = "0x1234567890123456789012345678901234567890"
deployment_block = 100

[verification]
provider = "static"

[proofs]
provider = "mock"
"#;
        let config: PoolConfig = toml::from_str(toml).unwrap();
        let ctx = PoolContext::from_config(&config).unwrap();
        assert_eq!(ctx.pool.tree_depth(), 12);
        assert_eq!(ctx.verification.provider_name().await, "static");
        assert_eq!(ctx.proofs.provider_name().await, "mock");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let toml = r#"
[tree]
depth = 0

[ledger]
rpc_url = "https://rpc.sepolia.org"
mixer_address = "0x1234567890123456789012345678901234567890"
deployment_block = 100

[verification]
provider = "static"

[proofs]
provider = "mock"
"#;
        let config: PoolConfig = toml::from_str(toml).unwrap();
        assert!(matches!(
            PoolContext::from_config(&config),
            Err(ContextError::Config(_))
        ));
    }
}
