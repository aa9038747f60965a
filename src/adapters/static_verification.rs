use std::collections::HashMap;
use std::sync::atomic::{
    AtomicBool,
    AtomicU64,
    Ordering,
};

use alloy::primitives::Address;

use crate::domain::verification::VerificationResult;
use crate::ports::verification::{
    VerificationError,
    VerificationProvider,
};

/// Static allowlist provider: every address in the map is answered from
/// memory, everything else is unverified. Used as the non-remote backend and
/// as the test double (it counts calls and can be told to fail).
pub struct StaticVerification {
    entries: HashMap<Address, VerificationResult>,
    failing: AtomicBool,
    calls: AtomicU64,
}

impl StaticVerification {
    pub fn new(entries: HashMap<Address, VerificationResult>) -> Self {
        Self {
            entries,
            failing: AtomicBool::new(false),
            calls: AtomicU64::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(HashMap::new())
    }

    /// Allowlist a set of addresses as plainly verified.
    pub fn allowing(addresses: impl IntoIterator<Item = Address>) -> Self {
        Self::new(
            addresses
                .into_iter()
                .map(|a| (a, VerificationResult::verified()))
                .collect(),
        )
    }

    /// Toggle failure mode: while set, every lookup errors.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of lookups that reached this provider (cache misses).
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VerificationProvider for StaticVerification {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn check_verification(
        &self,
        principal: Address,
    ) -> Result<VerificationResult, VerificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(VerificationError::ProviderFailure(
                "static provider in failure mode".into(),
            ));
        }
        Ok(self
            .entries
            .get(&principal)
            .cloned()
            .unwrap_or_else(VerificationResult::unverified))
    }

    async fn health_check(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }
}
