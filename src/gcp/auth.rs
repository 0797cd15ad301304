//! GCP Authentication
//!
//! Handles authentication using Application Default Credentials (ADC) with
//! an expiry-buffered token cache. A static-token mode exists for tests and
//! for embedders that manage tokens themselves.

use anyhow::{Context, Result};
use gcp_auth::TokenProvider;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default scopes for GCP API access
pub const DEFAULT_SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// GCP credentials holder with token caching
#[derive(Clone)]
pub enum Credentials {
    Adc {
        provider: Arc<dyn TokenProvider>,
        token_cache: Arc<RwLock<Option<CachedToken>>>,
    },
    /// Fixed token, never refreshed. For tests and external token managers.
    Static(String),
}

#[derive(Clone)]
pub struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl Credentials {
    /// Create credentials using Application Default Credentials
    pub async fn adc() -> Result<Self> {
        let provider = gcp_auth::provider().await.context(
            "Failed to initialize GCP authentication. Run 'gcloud auth application-default login'",
        )?;

        Ok(Self::Adc {
            provider,
            token_cache: Arc::new(RwLock::new(None)),
        })
    }

    pub fn fixed(token: &str) -> Self {
        Self::Static(token.to_string())
    }

    /// Get an access token for API calls, refreshing the cached one when it
    /// is expired or about to expire.
    pub async fn get_token(&self) -> Result<String> {
        let (provider, token_cache) = match self {
            Credentials::Static(token) => return Ok(token.clone()),
            Credentials::Adc {
                provider,
                token_cache,
            } => (provider, token_cache),
        };

        {
            let cache = token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let token = provider
            .token(DEFAULT_SCOPES)
            .await
            .context("Failed to get access token")?;
        let token_str = token.as_str().to_string();

        // gcp_auth does not expose a reliable expiry, so apply a
        // conservative TTL with the buffer already subtracted.
        let expires_at = Instant::now() + DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER;

        {
            let mut cache = token_cache.write().await;
            *cache = Some(CachedToken {
                token: token_str.clone(),
                expires_at,
            });
        }

        Ok(token_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_credentials_return_fixed_token() {
        let credentials = Credentials::fixed("test-token");
        assert_eq!(credentials.get_token().await.unwrap(), "test-token");
    }

    #[test]
    fn cached_token_expires() {
        let expired = CachedToken {
            token: "t".to_string(),
            expires_at: Instant::now() - Duration::from_secs(1),
        };
        assert!(!expired.is_valid());

        let fresh = CachedToken {
            token: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(60),
        };
        assert!(fresh.is_valid());
    }
}
