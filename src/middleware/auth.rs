// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::models::AuthPayload;
use crate::session::extract_token;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;

/// Verified session attached to the request by [`verify_user`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub claims: AuthPayload,
    /// The token the claims were decoded from
    pub token: String,
}

/// Sign a session token. Equal claims and secret always give the same token.
pub fn sign_token(payload: &AuthPayload, signing_key: &[u8]) -> anyhow::Result<String> {
    Ok(encode(
        &Header::new(Algorithm::HS256),
        payload,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Verify a token's signature and decode its claims.
pub fn decode_token(token: &str, signing_key: &[u8]) -> jsonwebtoken::errors::Result<AuthPayload> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;

    decode::<AuthPayload>(token, &DecodingKey::from_secret(signing_key), &validation)
        .map(|data| data.claims)
}

/// Middleware that verifies the session token when one is present.
///
/// No token and an invalid token both reject with 401. On success the
/// request carries a [`CurrentUser`] extension.
pub async fn verify_user(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&jar, request.headers())
        .ok_or_else(|| AppError::NotAuthorized(AppError::TOKEN_NOT_AVAILABLE.to_string()))?;

    let claims = decode_token(&token, &state.config.jwt_token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AppError::NotAuthorized(AppError::TOKEN_INVALID.to_string())
    })?;

    request
        .extensions_mut()
        .insert(CurrentUser { claims, token });

    Ok(next.run(request).await)
}

/// Middleware that requires [`verify_user`] to have attached claims.
pub async fn check_authentication(request: Request, next: Next) -> Result<Response, AppError> {
    if request.extensions().get::<CurrentUser>().is_none() {
        return Err(AppError::NotAuthorized(
            AppError::AUTHENTICATION_REQUIRED.to_string(),
        ));
    }
    Ok(next.run(request).await)
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::NotAuthorized(AppError::AUTHENTICATION_REQUIRED.to_string()))
    }
}
