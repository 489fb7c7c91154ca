//! Identity token verification
//!
//! Login trusts an externally issued identity token. Verification is behind
//! the [`IdentityVerifier`] trait so tests and offline development can stub
//! it; the production implementation calls Google's tokeninfo endpoint.
//!
//! The token's email is not required to match the declared uid - the uid is
//! the backend's only identity. The token merely has to verify.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Claims extracted from a verified identity token
#[derive(Debug, Clone)]
pub struct IdentityClaims {
    /// Stable subject id assigned by the identity provider
    pub subject: String,
    /// Email claim, when the provider supplies one
    pub email: Option<String>,
}

/// Token verification failure
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Token rejected (expired, malformed, signature invalid)
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Could not reach the identity provider
    #[error("Verification request failed: {0}")]
    Transport(String),
}

/// External identity verification capability
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<IdentityClaims, VerifyError>;
}

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Verifies Google Sign-In ID tokens against the tokeninfo endpoint
pub struct GoogleTokenVerifier {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    sub: String,
    email: Option<String>,
}

impl GoogleTokenVerifier {
    pub fn new() -> Self {
        Self::with_endpoint(GOOGLE_TOKENINFO_URL.to_string())
    }

    /// Use a non-default tokeninfo endpoint (local mock servers)
    pub fn with_endpoint(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

impl Default for GoogleTokenVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityVerifier for GoogleTokenVerifier {
    async fn verify(&self, token: &str) -> Result<IdentityClaims, VerifyError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(VerifyError::Invalid(detail));
        }
        if !status.is_success() {
            return Err(VerifyError::Transport(format!(
                "tokeninfo returned {}",
                status
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| VerifyError::Invalid(format!("malformed tokeninfo response: {}", e)))?;

        Ok(IdentityClaims {
            subject: info.sub,
            email: info.email,
        })
    }
}

/// Verifier that accepts exactly one known token
///
/// For tests and offline development; never use in production.
pub struct StaticTokenVerifier {
    token: String,
    claims: IdentityClaims,
}

impl StaticTokenVerifier {
    pub fn new(token: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            claims: IdentityClaims {
                subject: subject.into(),
                email: None,
            },
        }
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<IdentityClaims, VerifyError> {
        if token == self.token {
            Ok(IdentityClaims {
                subject: self.claims.subject.clone(),
                email: self.claims.email.clone(),
            })
        } else {
            Err(VerifyError::Invalid("unknown token".to_string()))
        }
    }
}
