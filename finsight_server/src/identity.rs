//! Verification of identity assertions against the identity provider's published keys.
//!
//! An assertion is only trusted after its signature has been checked against the provider's current JWK set and
//! its audience, issuer and expiry match the configured expectations. Claims are never read from an unverified
//! token.

use jsonwebtoken::{decode, decode_header, errors::ErrorKind, jwk::JwkSet, DecodingKey, Validation};
use log::*;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::IdentityConfig,
    errors::{AuthError, ServerError},
};

/// The claim set extracted from a successfully verified identity assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub subject: String,
    pub email: Option<String>,
}

/// The `IdentityProvider` trait is the seam between the sign-in handler and the concrete verifier, so endpoint
/// tests can substitute a mock without any network access.
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    /// Verifies the given identity assertion and extracts its subject and email claims.
    async fn verify_identity(&self, assertion: &str) -> Result<VerifiedIdentity, ServerError>;
}

#[derive(Clone)]
pub struct AppleIdentityVerifier {
    config: IdentityConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct IdentityClaims {
    sub: String,
    email: Option<String>,
}

impl AppleIdentityVerifier {
    pub fn new(config: IdentityConfig) -> Self {
        Self { config, client: Client::new() }
    }

    /// Fetches the provider's current key set. Keys are fetched per sign-in attempt and never cached.
    pub async fn fetch_key_set(&self) -> Result<JwkSet, ServerError> {
        trace!("Fetching identity provider keys from {}", self.config.jwks_url);
        let response = self
            .client
            .get(&self.config.jwks_url)
            .send()
            .await
            .map_err(|e| ServerError::UpstreamUnavailable(format!("Could not fetch identity provider keys. {e}")))?;
        if !response.status().is_success() {
            return Err(ServerError::UpstreamUnavailable(format!(
                "Identity provider key endpoint returned {}",
                response.status()
            )));
        }
        response
            .json::<JwkSet>()
            .await
            .map_err(|e| ServerError::UpstreamUnavailable(format!("Could not parse identity provider keys. {e}")))
    }

    /// Verifies an assertion against an already-fetched key set. Signature, audience, issuer and expiry must all
    /// hold before any claim is extracted.
    pub fn verify_with_keys(&self, assertion: &str, keys: &JwkSet) -> Result<VerifiedIdentity, AuthError> {
        let header = decode_header(assertion).map_err(|e| AuthError::InvalidTokenFormat(e.to_string()))?;
        let kid =
            header.kid.ok_or_else(|| AuthError::KeyResolutionFailed("the token header carries no key id".to_string()))?;
        let jwk = keys
            .find(&kid)
            .ok_or_else(|| AuthError::KeyResolutionFailed(format!("no provider key matches key id {kid}")))?;
        let key = DecodingKey::from_jwk(jwk).map_err(|e| AuthError::KeyResolutionFailed(e.to_string()))?;
        let mut validation = Validation::new(self.config.algorithm);
        validation.set_audience(&[self.config.client_id.as_str()]);
        validation.set_issuer(&[self.config.issuer.as_str()]);
        let data = decode::<IdentityClaims>(assertion, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::InvalidTokenFormat(e.to_string())
            },
            _ => AuthError::VerificationFailed(e.to_string()),
        })?;
        if data.claims.sub.is_empty() {
            return Err(AuthError::VerificationFailed("the token carries an empty subject".to_string()));
        }
        debug!("Identity assertion verified for subject {}", data.claims.sub);
        Ok(VerifiedIdentity { subject: data.claims.sub, email: data.claims.email })
    }
}

impl IdentityProvider for AppleIdentityVerifier {
    async fn verify_identity(&self, assertion: &str) -> Result<VerifiedIdentity, ServerError> {
        let keys = self.fetch_key_set().await?;
        Ok(self.verify_with_keys(assertion, &keys)?)
    }
}
