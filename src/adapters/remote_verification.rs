use std::time::Duration;

use alloy::primitives::Address;
use serde::Deserialize;

use crate::domain::verification::VerificationResult;
use crate::ports::verification::{
    VerificationError,
    VerificationProvider,
};

/// Per-request timeout for the verification API. Verification is fail-open,
/// so a slow provider must not stall callers for longer than this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Wire shape of `GET /wallets/{address}/status`.
///
/// `verified` is required: a response without the boolean flag fails
/// deserialization and is treated as a provider error, which keeps malformed
/// results out of the cache.
#[derive(Debug, Deserialize)]
struct WalletStatusResponse {
    verified: bool,
    #[serde(rename = "verificationLevel")]
    verification_level: Option<String>,
    #[serde(rename = "verifiedAt")]
    verified_at: Option<u64>,
    #[serde(rename = "expiresAt")]
    expires_at: Option<u64>,
}

/// Verification provider backed by a remote wallet-status API.
pub struct RemoteVerification {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RemoteVerification {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.get(format!("{}{path}", self.base_url));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }
}

impl VerificationProvider for RemoteVerification {
    fn name(&self) -> &'static str {
        "remote-api"
    }

    async fn check_verification(
        &self,
        principal: Address,
    ) -> Result<VerificationResult, VerificationError> {
        let response = self
            .request(&format!("/wallets/{principal}/status"))
            .send()
            .await
            .map_err(|e| VerificationError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerificationError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: WalletStatusResponse = response
            .json()
            .await
            .map_err(|e| VerificationError::MalformedResponse(e.to_string()))?;

        let mut result = VerificationResult {
            is_verified: parsed.verified,
            level: parsed.verification_level,
            expires_at: parsed.expires_at,
            metadata: Default::default(),
        };
        if let Some(verified_at) = parsed.verified_at {
            result
                .metadata
                .insert("verified_at".to_string(), verified_at.to_string());
        }
        Ok(result)
    }

    async fn health_check(&self) -> bool {
        match self.request("/health").send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
