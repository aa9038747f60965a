use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};

/// Outcome of an identity-verification lookup for one principal.
///
/// Immutable once produced: the cache only ever replaces whole entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub is_verified: bool,
    /// Provider-specific tier ("basic", "enhanced", ...), when reported.
    pub level: Option<String>,
    /// Unix timestamp after which the verification lapses, when reported.
    pub expires_at: Option<u64>,
    /// Free-form provider metadata. Degraded results carry a "degraded" tag
    /// here instead of surfacing an error.
    pub metadata: BTreeMap<String, String>,
}

impl VerificationResult {
    /// A verified result with no extra metadata.
    pub fn verified() -> Self {
        Self {
            is_verified: true,
            level: None,
            expires_at: None,
            metadata: BTreeMap::new(),
        }
    }

    /// An unverified result with no extra metadata.
    pub fn unverified() -> Self {
        Self {
            is_verified: false,
            level: None,
            expires_at: None,
            metadata: BTreeMap::new(),
        }
    }

    /// The fail-open fallback: unverified, tagged with the reason the
    /// provider could not answer.
    pub fn degraded(reason: &str) -> Self {
        let mut result = Self::unverified();
        result
            .metadata
            .insert("degraded".to_string(), reason.to_string());
        result
    }

    /// Whether this result came from the fail-open path rather than the
    /// provider. Degraded results are served but never cached.
    pub fn is_degraded(&self) -> bool {
        self.metadata.contains_key("degraded")
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: u64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_tagging() {
        let result = VerificationResult::degraded("provider unreachable");
        assert!(!result.is_verified);
        assert!(result.is_degraded());
        assert_eq!(
            result.metadata.get("degraded").map(String::as_str),
            Some("provider unreachable")
        );
    }

    #[test]
    fn test_builders() {
        let result = VerificationResult::verified()
            .with_level("enhanced")
            .with_expiry(1_900_000_000);
        assert!(result.is_verified);
        assert!(!result.is_degraded());
        assert_eq!(result.level.as_deref(), Some("enhanced"));
        assert_eq!(result.expires_at, Some(1_900_000_000));
    }
}
