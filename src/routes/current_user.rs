// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Current session user.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::UserProfile;
use crate::AppState;

/// Routes that need a verified session. The caller adds the auth layers.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/currentuser", get(current_user))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub is_user: bool,
    pub user: Option<UserProfile>,
    pub token: String,
}

/// Profile of the signed-in user: cache first, then the authoritative store.
async fn current_user(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<CurrentUserResponse>> {
    let user_id = &current.claims.user_id;

    let cached = state.user_cache.get_user_from_cache(user_id).await?;
    let user = match cached {
        Some(user) => Some(user),
        None => {
            tracing::debug!(user_id = %user_id, "Current user not cached, reading store");
            state.user_store.find_by_id(user_id).await?
        }
    };

    Ok(Json(match user {
        Some(user) => CurrentUserResponse {
            is_user: true,
            user: Some(user.for_response()),
            token: current.token,
        },
        None => CurrentUserResponse {
            is_user: false,
            user: None,
            token: String::new(),
        },
    }))
}
