//! The persistence seam for users and linked bank accounts.
//!
//! The backend itself is stateless; durable storage belongs to an external collaborator. Core components depend
//! only on the [`UserStore`] trait, never on a concrete store. [`MemoryStore`] is the in-process stand-in used
//! by the default server assembly.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use fsb_common::Secret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The stable subject identifier asserted by the identity provider.
    pub subject: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The durable association between a user and an aggregator item obtained from a public-token exchange.
#[derive(Debug, Clone)]
pub struct LinkedAccount {
    pub subject: String,
    pub access_token: Secret<String>,
    pub item_id: String,
    pub linked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("No user exists for the given subject.")]
    UserNotFound,
    #[error("The backing store failed. {0}")]
    StorageError(String),
}

/// The `UserStore` trait defines what the backend needs from its persistence collaborator.
#[allow(async_fn_in_trait)]
pub trait UserStore {
    /// Looks up a user by subject. Succeeds with `None` when the subject is unknown.
    async fn find_by_subject(&self, subject: &str) -> Result<Option<User>, StoreError>;

    /// Creates a new user record for the subject. The subject must not already exist.
    async fn create(&self, subject: &str, email: Option<String>) -> Result<User, StoreError>;

    /// Durably associates an exchanged access token and item id with the account's subject. Without this record
    /// no future account access can function, so the exchange handler treats a failure here as fatal for the
    /// request.
    async fn save_linked_account(&self, account: LinkedAccount) -> Result<(), StoreError>;

    /// Returns the existing user for the subject, creating one on first sign-in.
    async fn find_or_create(&self, subject: &str, email: Option<String>) -> Result<User, StoreError> {
        match self.find_by_subject(subject).await? {
            Some(user) => Ok(user),
            None => self.create(subject, email).await,
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    users: HashMap<String, User>,
    linked_accounts: HashMap<String, Vec<LinkedAccount>>,
}

impl UserStore for MemoryStore {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(subject).cloned())
    }

    async fn create(&self, subject: &str, email: Option<String>) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(subject) {
            return Err(StoreError::StorageError(format!("user {subject} already exists")));
        }
        let user = User { subject: subject.to_string(), email, created_at: Utc::now() };
        inner.users.insert(subject.to_string(), user.clone());
        Ok(user)
    }

    async fn save_linked_account(&self, account: LinkedAccount) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&account.subject) {
            return Err(StoreError::UserNotFound);
        }
        inner.linked_accounts.entry(account.subject.clone()).or_default().push(account);
        Ok(())
    }
}

impl MemoryStore {
    /// The items linked for a subject, in linking order.
    pub async fn linked_items(&self, subject: &str) -> Vec<String> {
        let inner = self.inner.read().await;
        inner
            .linked_accounts
            .get(subject)
            .map(|accounts| accounts.iter().map(|a| a.item_id.clone()).collect())
            .unwrap_or_default()
    }
}
