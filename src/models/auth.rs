// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login identity and session token claims.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credential record for one login identity.
///
/// Stored in the `auth` collection. Never changes after signup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecord {
    #[serde(rename = "_id")]
    pub id: String,
    /// 12-digit external id, as a digit string
    pub u_id: String,
    /// Title-cased username
    pub username: String,
    /// Lowercased email
    pub email: String,
    /// Argon2id PHC string
    pub password: String,
    pub avatar_color: String,
    pub created_at: DateTime<Utc>,
}

impl AuthRecord {
    /// Hash a plaintext password for storage.
    pub fn hash_password(plain: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(plain.as_bytes(), &salt)?
            .to_string())
    }

    /// Check a candidate password against the stored hash.
    ///
    /// A malformed stored hash never matches.
    pub fn compare_password(&self, candidate: &str) -> bool {
        match PasswordHash::new(&self.password) {
            Ok(hash) => Argon2::default()
                .verify_password(candidate.as_bytes(), &hash)
                .is_ok(),
            Err(e) => {
                tracing::warn!(auth_id = %self.id, error = %e, "Stored password hash is malformed");
                false
            }
        }
    }
}

/// Claims carried by a session token.
///
/// There is no `exp` or `iat`: the same claims always sign to the same token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    /// Profile id
    pub user_id: String,
    pub u_id: String,
    pub email: String,
    pub username: String,
    pub avatar_color: String,
}

impl AuthPayload {
    /// Claims for the profile `user_id` owned by `auth`.
    pub fn for_user(auth: &AuthRecord, user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            u_id: auth.u_id.clone(),
            email: auth.email.clone(),
            username: auth.username.clone(),
            avatar_color: auth.avatar_color.clone(),
        }
    }
}
