use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short-lived token that authorizes the client-side linking UI to start one linking flow for one end user.
/// Returned verbatim to the caller; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkToken {
    pub link_token: String,
    pub expiration: DateTime<Utc>,
    pub request_id: String,
}

/// The result of exchanging a public token: the durable access token for the linked item, and the item's
/// identifier. The caller is responsible for persisting the pair against the requesting user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedItem {
    pub access_token: String,
    pub item_id: String,
    pub request_id: String,
}
