use plaid_tools::PlaidConfig;
use serde::{Deserialize, Serialize};

use crate::store::User;

#[derive(Debug, Clone, Deserialize)]
pub struct AppleAuthRequest {
    /// The identity assertion produced by the client-side Sign in with Apple flow.
    pub identity_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self { id: user.subject, email: user.email }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicTokenRequest {
    pub public_token: String,
}

/// The access token itself never appears in this response; it is persisted server-side only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeResult {
    pub success: bool,
    pub item_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub subject: String,
    pub email: Option<String>,
}

/// The non-secret slice of the aggregator configuration exposed on the `/config` route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorSummary {
    pub environment: String,
    pub products: Vec<String>,
    pub country_codes: Vec<String>,
}

impl From<&PlaidConfig> for AggregatorSummary {
    fn from(config: &PlaidConfig) -> Self {
        Self {
            environment: config.environment.to_string(),
            products: config.products.iter().map(|p| p.to_string()).collect(),
            country_codes: config.country_codes.iter().map(|c| c.to_string()).collect(),
        }
    }
}
