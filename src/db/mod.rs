//! Authoritative stores for credentials and profiles.
//!
//! Handlers only see the [`AuthStore`] and [`UserStore`] traits. Production
//! uses Firestore; local development and tests use [`MemoryDb`].

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{AuthRecord, UserProfile};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const AUTH: &str = "auth";
    pub const USERS: &str = "users";
}

/// Credential store. Lookups expect already-normalised values
/// (title-cased username, lowercased email).
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Find a credential record matching either the username or the email.
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<AuthRecord>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<AuthRecord>, AppError>;

    async fn insert_auth_user(&self, record: &AuthRecord) -> Result<(), AppError>;
}

/// Profile store.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_auth_id(&self, auth_id: &str) -> Result<Option<UserProfile>, AppError>;

    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserProfile>, AppError>;

    async fn insert_user(&self, profile: &UserProfile) -> Result<(), AppError>;
}
