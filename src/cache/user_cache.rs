// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Denormalised user profiles in the fast-read store.
//!
//! A profile is stored as a flat hash at `user:<key>` where every value is a
//! string: scalars are formatted, nested values are JSON text. The sorted set
//! `user` maps each key to the numeric external id for ordering.

use crate::cache::backend::{CacheBackend, CacheError};
use crate::config::USER_INDEX_KEY;
use crate::error::AppError;
use crate::models::UserProfile;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// User cache over a [`CacheBackend`].
#[derive(Clone)]
pub struct UserCache {
    backend: CacheBackend,
}

impl UserCache {
    pub fn new(backend: CacheBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &CacheBackend {
        &self.backend
    }

    /// Write a profile and index it under its external id.
    pub async fn save_user_to_cache(
        &self,
        key: &str,
        u_id: &str,
        profile: &UserProfile,
    ) -> Result<(), AppError> {
        let score: f64 = u_id
            .parse::<u64>()
            .map_err(|e| AppError::CacheWrite(format!("invalid external id {u_id:?}: {e}")))?
            as f64;
        let fields = flatten(profile).map_err(|e| AppError::CacheWrite(e.to_string()))?;

        self.backend
            .zadd(USER_INDEX_KEY, key, score)
            .await
            .map_err(|e| AppError::CacheWrite(e.to_string()))?;
        self.backend
            .hset(&hash_key(key), &fields)
            .await
            .map_err(|e| AppError::CacheWrite(e.to_string()))?;

        tracing::debug!(key, u_id, "Saved user to cache");
        Ok(())
    }

    /// Read a profile back. `Ok(None)` when the key is not cached.
    pub async fn get_user_from_cache(&self, key: &str) -> Result<Option<UserProfile>, AppError> {
        let fields = self
            .backend
            .hgetall(&hash_key(key))
            .await
            .map_err(|e| AppError::CacheRead(e.to_string()))?;

        if fields.is_empty() {
            return Ok(None);
        }

        unflatten(&fields)
            .map(Some)
            .map_err(|e| AppError::CacheRead(e.to_string()))
    }

    /// Number of users in the ordered index.
    pub async fn total_users_in_cache(&self) -> Result<u64, AppError> {
        self.backend
            .zcard(USER_INDEX_KEY)
            .await
            .map_err(|e| AppError::CacheRead(e.to_string()))
    }
}

fn hash_key(key: &str) -> String {
    format!("{USER_INDEX_KEY}:{key}")
}

/// Flatten a profile into string fields.
pub fn flatten(profile: &UserProfile) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
    Ok(vec![
        ("_id", profile.id.clone()),
        ("authId", profile.auth_id.clone()),
        ("uId", profile.u_id.clone()),
        ("username", profile.username.clone()),
        ("email", profile.email.clone()),
        ("password", profile.password.clone()),
        ("avatarColor", profile.avatar_color.clone()),
        ("createdAt", profile.created_at.to_rfc3339()),
        ("postsCount", profile.posts_count.to_string()),
        ("blocked", serde_json::to_string(&profile.blocked)?),
        ("blockedBy", serde_json::to_string(&profile.blocked_by)?),
        ("profilePicture", profile.profile_picture.clone()),
        ("followersCount", profile.followers_count.to_string()),
        ("followingCount", profile.following_count.to_string()),
        ("notifications", serde_json::to_string(&profile.notifications)?),
        ("social", serde_json::to_string(&profile.social)?),
        ("work", profile.work.clone()),
        ("location", profile.location.clone()),
        ("school", profile.school.clone()),
        ("quote", profile.quote.clone()),
        ("bgImageVersion", profile.bg_image_version.clone()),
        ("bgImageId", profile.bg_image_id.clone()),
    ])
}

/// Rebuild a profile from its string fields.
pub fn unflatten(fields: &HashMap<String, String>) -> Result<UserProfile, CacheError> {
    Ok(UserProfile {
        id: text(fields, "_id")?,
        auth_id: text(fields, "authId")?,
        u_id: text(fields, "uId")?,
        username: text(fields, "username")?,
        email: text(fields, "email")?,
        password: fields.get("password").cloned().unwrap_or_default(),
        avatar_color: text(fields, "avatarColor")?,
        profile_picture: text(fields, "profilePicture")?,
        blocked: json(fields, "blocked")?,
        blocked_by: json(fields, "blockedBy")?,
        work: text(fields, "work")?,
        location: text(fields, "location")?,
        school: text(fields, "school")?,
        quote: text(fields, "quote")?,
        bg_image_version: text(fields, "bgImageVersion")?,
        bg_image_id: text(fields, "bgImageId")?,
        followers_count: count(fields, "followersCount")?,
        following_count: count(fields, "followingCount")?,
        posts_count: count(fields, "postsCount")?,
        notifications: json(fields, "notifications")?,
        social: json(fields, "social")?,
        created_at: timestamp(fields, "createdAt")?,
    })
}

fn text(fields: &HashMap<String, String>, field: &'static str) -> Result<String, CacheError> {
    fields.get(field).cloned().ok_or(CacheError::Corrupt {
        field,
        reason: "missing".to_string(),
    })
}

fn json<T: DeserializeOwned>(
    fields: &HashMap<String, String>,
    field: &'static str,
) -> Result<T, CacheError> {
    serde_json::from_str(&text(fields, field)?).map_err(|e| CacheError::Corrupt {
        field,
        reason: e.to_string(),
    })
}

fn count(fields: &HashMap<String, String>, field: &'static str) -> Result<u64, CacheError> {
    text(fields, field)?
        .parse()
        .map_err(|e: std::num::ParseIntError| CacheError::Corrupt {
            field,
            reason: e.to_string(),
        })
}

fn timestamp(
    fields: &HashMap<String, String>,
    field: &'static str,
) -> Result<DateTime<Utc>, CacheError> {
    DateTime::parse_from_rfc3339(&text(fields, field)?)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CacheError::Corrupt {
            field,
            reason: e.to_string(),
        })
}
