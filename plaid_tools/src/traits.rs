use crate::{LinkToken, LinkedItem, PlaidApiError};

/// The `Aggregator` trait defines the two operations this backend delegates to the financial-data aggregator.
///
/// [`crate::PlaidApi`] is the production implementation. Server handlers are generic over this trait so that
/// endpoint tests can substitute a mock without any network access.
#[allow(async_fn_in_trait)]
pub trait Aggregator {
    /// Requests a short-lived link token scoped to the given end-user identifier. The token is consumed by the
    /// client-side linking UI; the backend only relays it.
    async fn create_link_token(&self, user_id: &str) -> Result<LinkToken, PlaidApiError>;

    /// Exchanges a public token (produced by the linking UI) for a durable access token and item id. The
    /// aggregator enforces that each public token is exchanged at most once; a second exchange fails upstream.
    async fn exchange_public_token(&self, public_token: &str) -> Result<LinkedItem, PlaidApiError>;
}
