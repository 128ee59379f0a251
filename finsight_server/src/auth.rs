//! Session-token issuance and verification.
//!
//! Session tokens are self-contained signed JWTs; no server-side session store is involved in validating them.
//! The issuer and verifier are built from the same [`AuthConfig`] so a token minted by one process instance is
//! accepted by any instance sharing the secret.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenIssuer {
    header: Header,
    encoding_key: EncodingKey,
    default_lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            header: Header::new(config.algorithm),
            encoding_key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()),
            default_lifetime: config.session_lifetime,
        }
    }

    /// Issue a new session token for the given subject.
    /// The subject MUST come from a verified identity assertion; this method does not re-verify it.
    pub fn issue_token(
        &self,
        subject: &str,
        email: Option<String>,
        lifetime: Option<Duration>,
    ) -> Result<String, ServerError> {
        let now = Utc::now();
        let lifetime = lifetime.unwrap_or(self.default_lifetime);
        let claims = JwtClaims {
            sub: subject.to_string(),
            email,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        };
        encode(&self.header, &claims, &self.encoding_key)
            .map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))
    }
}

#[derive(Clone)]
pub struct SessionVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(config.algorithm);
        // A token whose embedded expiry has passed is rejected, with no leeway.
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self { decoding_key: DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes()), validation }
    }

    /// Every failure mode (bad signature, expiry, missing subject) collapses into [`AuthError::Unauthorized`];
    /// the underlying cause is logged at debug level and never surfaced to the caller.
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation).map(|data| data.claims).map_err(|e| {
            debug!("💻️ Session token rejected. {e}");
            AuthError::Unauthorized
        })
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let verifier = req
        .app_data::<web::Data<SessionVerifier>>()
        .ok_or_else(|| ServerError::InitializeError("SessionVerifier is not registered with the app".to_string()))?;
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::Unauthorized)?;
    Ok(verifier.validate_token(bearer.trim())?)
}
