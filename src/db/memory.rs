// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process stores for local development and tests.

use crate::db::{AuthStore, UserStore};
use crate::error::AppError;
use crate::models::{AuthRecord, UserProfile};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Credential and profile store backed by concurrent maps keyed by document id.
#[derive(Clone, Default)]
pub struct MemoryDb {
    auth: Arc<DashMap<String, AuthRecord>>,
    users: Arc<DashMap<String, UserProfile>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auth_count(&self) -> usize {
        self.auth.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl AuthStore for MemoryDb {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<AuthRecord>, AppError> {
        Ok(self
            .auth
            .iter()
            .find(|entry| entry.username == username || entry.email == email)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<AuthRecord>, AppError> {
        Ok(self
            .auth
            .iter()
            .find(|entry| entry.username == username)
            .map(|entry| entry.value().clone()))
    }

    async fn insert_auth_user(&self, record: &AuthRecord) -> Result<(), AppError> {
        self.auth.insert(record.id.clone(), record.clone());
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn find_by_auth_id(&self, auth_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.auth_id == auth_id)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.users.get(user_id).map(|entry| entry.value().clone()))
    }

    async fn insert_user(&self, profile: &UserProfile) -> Result<(), AppError> {
        self.users.insert(profile.id.clone(), profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str, username: &str, email: &str) -> AuthRecord {
        AuthRecord {
            id: id.to_string(),
            u_id: "111111111111".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: String::new(),
            avatar_color: "red".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn finds_by_username_or_email() {
        let db = MemoryDb::new();
        db.insert_auth_user(&record("a1", "Danny", "danny@me.com"))
            .await
            .unwrap();

        let by_name = db
            .find_by_username_or_email("Danny", "other@me.com")
            .await
            .unwrap();
        assert_eq!(by_name.map(|r| r.id), Some("a1".to_string()));

        let by_email = db
            .find_by_username_or_email("Other", "danny@me.com")
            .await
            .unwrap();
        assert!(by_email.is_some());

        let none = db
            .find_by_username_or_email("Other", "other@me.com")
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn insert_is_idempotent_per_id() {
        let db = MemoryDb::new();
        let rec = record("a1", "Danny", "danny@me.com");
        db.insert_auth_user(&rec).await.unwrap();
        db.insert_auth_user(&rec).await.unwrap();
        assert_eq!(db.auth_count(), 1);
    }

    #[tokio::test]
    async fn finds_profile_by_auth_id() {
        let db = MemoryDb::new();
        let profile = UserProfile::from_auth_record(&record("a1", "Danny", "d@me.com"), "u1");
        db.insert_user(&profile).await.unwrap();

        assert_eq!(db.find_by_auth_id("a1").await.unwrap(), Some(profile.clone()));
        assert_eq!(db.find_by_id("u1").await.unwrap(), Some(profile));
        assert!(db.find_by_auth_id("a2").await.unwrap().is_none());
    }
}
