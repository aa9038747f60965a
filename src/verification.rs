use std::collections::HashMap;
use std::time::{
    Duration,
    Instant,
};

use alloy::primitives::Address;
use tokio::sync::Mutex;

use crate::adapters::remote_verification::RemoteVerification;
use crate::adapters::static_verification::StaticVerification;
use crate::domain::verification::VerificationResult;
use crate::ports::verification::{
    VerificationError,
    VerificationProvider,
};

/// Default freshness window for cached verification results.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// The verification backends the service can run on. A closed sum rather
/// than a trait object: the provider trait's async methods keep it from
/// being object-safe, and the set of backends is known at build time.
pub enum VerificationBackend {
    Remote(RemoteVerification),
    Static(StaticVerification),
}

impl VerificationBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Remote(p) => p.name(),
            Self::Static(p) => p.name(),
        }
    }

    async fn check_verification(
        &self,
        principal: Address,
    ) -> Result<VerificationResult, VerificationError> {
        match self {
            Self::Remote(p) => p.check_verification(principal).await,
            Self::Static(p) => p.check_verification(principal).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            Self::Remote(p) => p.health_check().await,
            Self::Static(p) => p.health_check().await,
        }
    }
}

struct CacheEntry {
    result: VerificationResult,
    inserted_at: Instant,
}

struct ServiceState {
    backend: VerificationBackend,
    cache: HashMap<Address, CacheEntry>,
}

/// Caching facade over the active verification backend.
///
/// Lookups are fail-open: when the backend errors, the caller gets the stale
/// cached result if one exists, otherwise an explicitly degraded unverified
/// result. Only clean backend answers enter the cache, so a degraded answer
/// never masquerades as a fresh one. Proof generation does NOT share this
/// policy; see [`crate::proving`].
pub struct VerificationService {
    state: Mutex<ServiceState>,
    cache_ttl: Duration,
}

impl VerificationService {
    pub fn new(backend: VerificationBackend, cache_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(ServiceState {
                backend,
                cache: HashMap::new(),
            }),
            cache_ttl,
        }
    }

    pub fn with_default_ttl(backend: VerificationBackend) -> Self {
        Self::new(backend, DEFAULT_CACHE_TTL)
    }

    pub async fn provider_name(&self) -> &'static str {
        self.state.lock().await.backend.name()
    }

    /// Check one principal, consulting the cache first.
    pub async fn check_verification(&self, principal: Address) -> VerificationResult {
        let mut state = self.state.lock().await;

        if let Some(entry) = state.cache.get(&principal) {
            if entry.inserted_at.elapsed() < self.cache_ttl {
                return entry.result.clone();
            }
        }

        match state.backend.check_verification(principal).await {
            Ok(result) => {
                state.cache.insert(
                    principal,
                    CacheEntry {
                        result: result.clone(),
                        inserted_at: Instant::now(),
                    },
                );
                result
            }
            Err(err) => {
                // Stale beats degraded; degraded beats failing the caller.
                if let Some(entry) = state.cache.get(&principal) {
                    tracing::warn!(
                        %principal,
                        provider = state.backend.name(),
                        error = %err,
                        "verification provider failed, serving stale cache entry"
                    );
                    return entry.result.clone();
                }
                tracing::warn!(
                    %principal,
                    provider = state.backend.name(),
                    error = %err,
                    "verification provider failed with no cached result, degrading"
                );
                VerificationResult::degraded(&err.to_string())
            }
        }
    }

    /// Check a batch of principals with the same per-principal policy.
    pub async fn batch_check(
        &self,
        principals: &[Address],
    ) -> HashMap<Address, VerificationResult> {
        let mut results = HashMap::with_capacity(principals.len());
        for &principal in principals {
            results.insert(principal, self.check_verification(principal).await);
        }
        results
    }

    pub async fn health_check(&self) -> bool {
        self.state.lock().await.backend.health_check().await
    }

    /// Replace the active backend. The cache is cleared in the same critical
    /// section, so no lookup can observe the new backend with the old
    /// backend's cached answers. Swaps are security-relevant and always
    /// logged.
    pub async fn swap_provider(&self, new_backend: VerificationBackend) {
        let mut state = self.state.lock().await;
        let old_name = state.backend.name();
        let new_name = new_backend.name();
        let evicted = state.cache.len();
        state.backend = new_backend;
        state.cache.clear();
        tracing::warn!(
            old_provider = old_name,
            new_provider = new_name,
            evicted_entries = evicted,
            "verification provider swapped, cache cleared"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with_allowlist(
        addresses: impl IntoIterator<Item = Address>,
        ttl: Duration,
    ) -> VerificationService {
        VerificationService::new(
            VerificationBackend::Static(StaticVerification::allowing(addresses)),
            ttl,
        )
    }

    #[tokio::test]
    async fn test_cache_hit_skips_provider() {
        let wallet = Address::repeat_byte(0x11);
        let service = service_with_allowlist([wallet], Duration::from_secs(60));

        assert!(service.check_verification(wallet).await.is_verified);
        assert!(service.check_verification(wallet).await.is_verified);

        let state = service.state.lock().await;
        match &state.backend {
            VerificationBackend::Static(p) => assert_eq!(p.call_count(), 1),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let wallet = Address::repeat_byte(0x22);
        let service = service_with_allowlist([wallet], Duration::from_millis(20));

        service.check_verification(wallet).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        service.check_verification(wallet).await;

        let state = service.state.lock().await;
        match &state.backend {
            VerificationBackend::Static(p) => assert_eq!(p.call_count(), 2),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_failure_serves_stale_cache() {
        let wallet = Address::repeat_byte(0x33);
        let backend = StaticVerification::allowing([wallet]);
        let service = VerificationService::new(
            VerificationBackend::Static(backend),
            Duration::from_millis(10),
        );

        assert!(service.check_verification(wallet).await.is_verified);

        // Let the entry expire, then break the provider.
        tokio::time::sleep(Duration::from_millis(30)).await;
        {
            let state = service.state.lock().await;
            match &state.backend {
                VerificationBackend::Static(p) => p.set_failing(true),
                _ => unreachable!(),
            }
        }

        let result = service.check_verification(wallet).await;
        assert!(result.is_verified, "stale result still served");
        assert!(!result.is_degraded());
    }

    #[tokio::test]
    async fn test_failure_without_cache_degrades() {
        let backend = StaticVerification::empty();
        backend.set_failing(true);
        let service = VerificationService::with_default_ttl(
            VerificationBackend::Static(backend),
        );

        let result = service.check_verification(Address::repeat_byte(0x44)).await;
        assert!(!result.is_verified);
        assert!(result.is_degraded());
    }

    #[tokio::test]
    async fn test_degraded_results_not_cached() {
        let backend = StaticVerification::empty();
        backend.set_failing(true);
        let service = VerificationService::with_default_ttl(
            VerificationBackend::Static(backend),
        );
        let wallet = Address::repeat_byte(0x55);

        assert!(service.check_verification(wallet).await.is_degraded());

        // Provider recovers; the degraded answer must not stick.
        {
            let state = service.state.lock().await;
            match &state.backend {
                VerificationBackend::Static(p) => p.set_failing(false),
                _ => unreachable!(),
            }
        }
        assert!(!service.check_verification(wallet).await.is_degraded());
    }

    #[tokio::test]
    async fn test_swap_clears_cache() {
        let wallet = Address::repeat_byte(0x66);
        let service = service_with_allowlist([wallet], Duration::from_secs(60));

        assert!(service.check_verification(wallet).await.is_verified);

        // New backend does not allowlist the wallet; a cached "verified"
        // from the old backend must not survive the swap.
        service
            .swap_provider(VerificationBackend::Static(StaticVerification::empty()))
            .await;
        assert!(!service.check_verification(wallet).await.is_verified);
    }

    #[tokio::test]
    async fn test_batch_check() {
        let a = Address::repeat_byte(0x01);
        let b = Address::repeat_byte(0x02);
        let service = service_with_allowlist([a], Duration::from_secs(60));

        let results = service.batch_check(&[a, b]).await;
        assert!(results[&a].is_verified);
        assert!(!results[&b].is_verified);
    }
}
