//! Social profile model for storage, cache, and API.

use crate::models::AuthRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification preferences. Everything is on for a new user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub messages: bool,
    pub reactions: bool,
    pub comments: bool,
    pub follows: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            messages: true,
            reactions: true,
            comments: true,
            follows: true,
        }
    }
}

/// Social profile links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub facebook: String,
    pub instagram: String,
    pub twitter: String,
    pub youtube: String,
}

/// User profile stored in the `users` collection and in the user cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    /// Id of the owning `AuthRecord`
    pub auth_id: String,
    pub u_id: String,
    pub username: String,
    pub email: String,
    /// Copy of the credential hash. Empty (and omitted) in API responses.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    pub avatar_color: String,
    pub profile_picture: String,
    pub blocked: Vec<String>,
    pub blocked_by: Vec<String>,
    pub work: String,
    pub location: String,
    pub school: String,
    pub quote: String,
    pub bg_image_version: String,
    pub bg_image_id: String,
    pub followers_count: u64,
    pub following_count: u64,
    pub posts_count: u64,
    pub notifications: NotificationSettings,
    pub social: SocialLinks,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Build the initial profile for a freshly created identity.
    pub fn from_auth_record(auth: &AuthRecord, profile_id: &str) -> Self {
        Self {
            id: profile_id.to_string(),
            auth_id: auth.id.clone(),
            u_id: auth.u_id.clone(),
            username: auth.username.clone(),
            email: auth.email.clone(),
            password: auth.password.clone(),
            avatar_color: auth.avatar_color.clone(),
            profile_picture: String::new(),
            blocked: Vec::new(),
            blocked_by: Vec::new(),
            work: String::new(),
            location: String::new(),
            school: String::new(),
            quote: String::new(),
            bg_image_version: String::new(),
            bg_image_id: String::new(),
            followers_count: 0,
            following_count: 0,
            posts_count: 0,
            notifications: NotificationSettings::default(),
            social: SocialLinks::default(),
            created_at: auth.created_at,
        }
    }

    /// Overlay the identity fields of the credential record, as returned on sign-in.
    pub fn merged_with(mut self, auth: &AuthRecord) -> Self {
        self.auth_id = auth.id.clone();
        self.username = auth.username.clone();
        self.email = auth.email.clone();
        self.avatar_color = auth.avatar_color.clone();
        self.u_id = auth.u_id.clone();
        self.created_at = auth.created_at;
        self
    }

    /// Copy suitable for an HTTP response body.
    pub fn for_response(&self) -> Self {
        Self {
            password: String::new(),
            ..self.clone()
        }
    }
}
