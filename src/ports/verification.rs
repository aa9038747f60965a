use std::collections::HashMap;

use alloy::primitives::Address;
use thiserror::Error;

use crate::domain::verification::VerificationResult;

/// Errors from verification providers.
///
/// These never reach callers of the verification service: the caching layer
/// degrades every one of them to an unverified result (fail-open), because
/// identity checks must not block an unrelated critical path.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("verification API unreachable: {0}")]
    Unreachable(String),

    #[error("verification API returned {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("malformed verification response: {0}")]
    MalformedResponse(String),

    #[error("provider failure: {0}")]
    ProviderFailure(String),
}

/// Capability interface for "is this principal verified" queries.
pub trait VerificationProvider: Send + Sync {
    /// Stable provider identity, recorded in swap audit events.
    fn name(&self) -> &'static str;

    /// Look up the verification status of one principal.
    fn check_verification(
        &self,
        principal: Address,
    ) -> impl core::future::Future<Output = Result<VerificationResult, VerificationError>>;

    /// Look up several principals. The default loops over
    /// `check_verification`; providers with a bulk endpoint may override.
    fn batch_check(
        &self,
        principals: &[Address],
    ) -> impl core::future::Future<
        Output = Result<HashMap<Address, VerificationResult>, VerificationError>,
    > {
        async move {
            let mut results = HashMap::with_capacity(principals.len());
            for principal in principals {
                results.insert(*principal, self.check_verification(*principal).await?);
            }
            Ok(results)
        }
    }

    /// Whether the provider can currently answer queries.
    fn health_check(&self) -> impl core::future::Future<Output = bool>;
}
