use std::env;

use chrono::Duration;
use fsb_common::Secret;
use jsonwebtoken::Algorithm;
use log::*;
use plaid_tools::PlaidConfig;

use crate::errors::ServerError;

const DEFAULT_FSB_HOST: &str = "127.0.0.1";
const DEFAULT_FSB_PORT: u16 = 8000;
const DEFAULT_SESSION_LIFETIME_MINUTES: i64 = 1440;
const MIN_SECRET_LEN: usize = 32;

pub const DEFAULT_APPLE_ISSUER: &str = "https://appleid.apple.com";
pub const DEFAULT_APPLE_JWKS_URL: &str = "https://appleid.apple.com/auth/keys";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
    /// Identity-provider verification settings (expected audience, issuer and key-discovery URL).
    pub identity: IdentityConfig,
    /// Aggregator credentials and linking-UI settings.
    pub plaid: PlaidConfig,
}

impl ServerConfig {
    /// Loads the full server configuration from environment variables. Host and port fall back to defaults with
    /// a warning; a missing session secret, a missing identity client id, or an invalid aggregator configuration
    /// is fatal — the server must not start half-configured.
    pub fn try_from_env() -> Result<Self, ServerError> {
        let host = env::var("FSB_HOST").ok().unwrap_or_else(|| DEFAULT_FSB_HOST.into());
        let port = env::var("FSB_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for FSB_PORT. {e} Using the default, {DEFAULT_FSB_PORT}, instead."
                    );
                    DEFAULT_FSB_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_FSB_PORT);
        let auth = AuthConfig::try_from_env()?;
        let identity = IdentityConfig::try_from_env()?;
        let plaid = PlaidConfig::try_from_env().map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
        Ok(Self { host, port, auth, identity, plaid })
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------

/// Configuration for minting and verifying session tokens. The same secret and algorithm are shared by the
/// [`crate::auth::TokenIssuer`] and the [`crate::auth::SessionVerifier`].
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    /// Only the HMAC family is supported; session tokens are signed and verified by the same process.
    pub algorithm: Algorithm,
    pub session_lifetime: Duration,
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("FSB_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [FSB_JWT_SECRET]")))?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ServerError::ConfigurationError(format!(
                "FSB_JWT_SECRET must be at least {MIN_SECRET_LEN} characters long"
            )));
        }
        let algorithm = match env::var("FSB_JWT_ALGORITHM").map(|s| s.to_uppercase()) {
            Ok(s) if s == "HS256" => Algorithm::HS256,
            Ok(s) if s == "HS384" => Algorithm::HS384,
            Ok(s) if s == "HS512" => Algorithm::HS512,
            Ok(s) => {
                return Err(ServerError::ConfigurationError(format!(
                    "{s} is not a supported session signing algorithm. Use HS256, HS384 or HS512."
                )))
            },
            Err(_) => {
                info!("🪛️ FSB_JWT_ALGORITHM not set, using HS256 as default");
                Algorithm::HS256
            },
        };
        let session_lifetime = configure_session_lifetime()?;
        Ok(Self { jwt_secret: Secret::new(secret), algorithm, session_lifetime })
    }
}

fn configure_session_lifetime() -> Result<Duration, ServerError> {
    let minutes = env::var("FSB_SESSION_LIFETIME_MINUTES")
        .map_err(|_| {
            info!(
                "🪛️ FSB_SESSION_LIFETIME_MINUTES is not set. Using the default value of \
                 {DEFAULT_SESSION_LIFETIME_MINUTES} minutes."
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for FSB_SESSION_LIFETIME_MINUTES. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_SESSION_LIFETIME_MINUTES);
    if minutes <= 0 {
        return Err(ServerError::ConfigurationError("FSB_SESSION_LIFETIME_MINUTES must be positive".to_string()));
    }
    Ok(Duration::minutes(minutes))
}

//-------------------------------------------------  IdentityConfig  ---------------------------------------------------

/// Settings for verifying identity assertions against the identity provider's published keys.
#[derive(Clone, Debug)]
pub struct IdentityConfig {
    /// The app's client id with the identity provider; assertions must carry it as their audience.
    pub client_id: String,
    pub issuer: String,
    /// The key-discovery endpoint serving the provider's current JWK set.
    pub jwks_url: String,
    pub algorithm: Algorithm,
}

impl IdentityConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let client_id = env::var("FSB_APPLE_CLIENT_ID")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [FSB_APPLE_CLIENT_ID]")))?;
        let issuer = env::var("FSB_APPLE_ISSUER").ok().unwrap_or_else(|| DEFAULT_APPLE_ISSUER.into());
        let jwks_url = env::var("FSB_APPLE_JWKS_URL").ok().unwrap_or_else(|| DEFAULT_APPLE_JWKS_URL.into());
        Ok(Self { client_id, issuer, jwks_url, algorithm: Algorithm::RS256 })
    }
}
