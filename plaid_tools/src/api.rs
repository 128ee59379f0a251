use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{config::PlaidConfig, Aggregator, LinkToken, LinkedItem, PlaidApiError};

#[derive(Clone)]
pub struct PlaidApi {
    config: PlaidConfig,
    client: Arc<Client>,
}

impl PlaidApi {
    pub fn new(config: PlaidConfig) -> Result<Self, PlaidApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let client_id = HeaderValue::from_str(config.client_id.as_str())
            .map_err(|e| PlaidApiError::Initialization(e.to_string()))?;
        let secret = HeaderValue::from_str(config.secret.reveal().as_str())
            .map_err(|e| PlaidApiError::Initialization(e.to_string()))?;
        headers.insert("PLAID-CLIENT-ID", client_id);
        headers.insert("PLAID-SECRET", secret);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PlaidApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.environment.base_url())
    }

    /// The aggregator API is POST-only JSON. A non-2xx status carries a JSON error body; its `error_message` and
    /// `error_code` are folded into the returned [`PlaidApiError::QueryError`].
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PlaidApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let response =
            self.client.post(url).json(body).send().await.map_err(|e| PlaidApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| PlaidApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|e| PlaidApiError::RestResponseError(e.to_string()))?;
            Err(PlaidApiError::QueryError { status, message: extract_error_detail(&text) })
        }
    }
}

impl Aggregator for PlaidApi {
    async fn create_link_token(&self, user_id: &str) -> Result<LinkToken, PlaidApiError> {
        if user_id.trim().is_empty() {
            return Err(PlaidApiError::RestRequestError("user id must not be empty".to_string()));
        }
        let body = serde_json::json!({
            "user": { "client_user_id": user_id },
            "client_name": self.config.client_name,
            "products": self.config.products,
            "country_codes": self.config.country_codes,
            "language": self.config.language,
        });
        debug!("Requesting link token for user {user_id}");
        let token = self.rest_query::<LinkToken, _>("/link/token/create", &body).await?;
        info!("Issued link token for user {user_id} (request {})", token.request_id);
        Ok(token)
    }

    async fn exchange_public_token(&self, public_token: &str) -> Result<LinkedItem, PlaidApiError> {
        let body = serde_json::json!({ "public_token": public_token });
        debug!("Exchanging public token");
        let item = self.rest_query::<LinkedItem, _>("/item/public_token/exchange", &body).await?;
        info!("Exchanged public token for item {} (request {})", item.item_id, item.request_id);
        Ok(item)
    }
}

/// Error bodies look like `{"error_type": ..., "error_code": ..., "error_message": ...}`. Anything else is
/// passed through as-is.
fn extract_error_detail(text: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error_code: String,
        error_message: String,
    }
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) => format!("{} ({})", body.error_message, body.error_code),
        Err(_) => text.to_string(),
    }
}
