use mockall::mock;
use plaid_tools::{Aggregator, LinkToken, LinkedItem, PlaidApiError};

use crate::{
    errors::ServerError,
    identity::{IdentityProvider, VerifiedIdentity},
    store::{LinkedAccount, StoreError, User, UserStore},
};

mock! {
    pub AggregatorClient {}
    impl Aggregator for AggregatorClient {
        async fn create_link_token(&self, user_id: &str) -> Result<LinkToken, PlaidApiError>;
        async fn exchange_public_token(&self, public_token: &str) -> Result<LinkedItem, PlaidApiError>;
    }
}

mock! {
    pub Identity {}
    impl IdentityProvider for Identity {
        async fn verify_identity(&self, assertion: &str) -> Result<VerifiedIdentity, ServerError>;
    }
}

mock! {
    pub Store {}
    impl UserStore for Store {
        async fn find_by_subject(&self, subject: &str) -> Result<Option<User>, StoreError>;
        async fn create(&self, subject: &str, email: Option<String>) -> Result<User, StoreError>;
        async fn save_linked_account(&self, account: LinkedAccount) -> Result<(), StoreError>;
    }
}
