// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-up, sign-in and sign-out routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::helpers::{first_letter_uppercase, generate_random_integers, lower_case, new_object_id};
use crate::middleware::auth::sign_token;
use crate::models::{AuthPayload, AuthRecord, UserProfile};
use crate::services::queue::{EmailJob, Job};
use crate::services::templates::{password_reset_confirmation, ResetPasswordParams};
use crate::session::{removal_cookie, session_cookie};
use crate::validation::{validate_request, SignInRequest, SignUpRequest};
use crate::AppState;

/// Length of the numeric external id.
const U_ID_DIGITS: usize = 12;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", get(signout))
}

/// Body of every auth response.
#[derive(Debug, Serialize)]
pub struct AuthResponse<U: Serialize> {
    pub message: &'static str,
    pub user: U,
    pub token: String,
}

type AuthReply = (StatusCode, CookieJar, Json<AuthResponse<UserProfile>>);

/// Unwrap a JSON body, reporting malformed bodies as validation errors.
fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

async fn hash_password(plain: String) -> Result<String> {
    tokio::task::spawn_blocking(move || AuthRecord::hash_password(&plain))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

async fn compare_password(auth: AuthRecord, candidate: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || auth.compare_password(&candidate))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Verification task failed: {}", e)))
}

/// Create an identity, cache its profile, and queue the persistence jobs.
async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: std::result::Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<AuthReply> {
    let request = json_body(body)?;
    validate_request(&request)?;

    let username = first_letter_uppercase(&request.username);
    let email = lower_case(&request.email);

    if state
        .auth_store
        .find_by_username_or_email(&username, &email)
        .await?
        .is_some()
    {
        tracing::info!(username = %username, "Signup rejected: user exists");
        return Err(AppError::DuplicateUser);
    }

    let auth_id = new_object_id();
    let user_id = new_object_id();
    let u_id = generate_random_integers(U_ID_DIGITS);

    let auth = AuthRecord {
        id: auth_id,
        u_id: u_id.clone(),
        username,
        email,
        password: hash_password(request.password).await?,
        avatar_color: request.avatar_color,
        created_at: Utc::now(),
    };

    let upload = state
        .uploader
        .upload(&request.avatar_image, &user_id, true, true)
        .await?;

    let mut profile = UserProfile::from_auth_record(&auth, &user_id);
    profile.profile_picture = state
        .config
        .profile_picture_url(&upload.version, &user_id);

    state
        .user_cache
        .save_user_to_cache(&user_id, &u_id, &profile)
        .await?;

    let payload = AuthPayload::for_user(&auth, &user_id);
    state.job_queue.add_job(Job::AddAuthUserToDb(auth)).await?;
    state
        .job_queue
        .add_job(Job::AddUserToDb(profile.clone()))
        .await?;

    let token = sign_token(&payload, &state.config.jwt_token)?;

    tracing::info!(user_id = %user_id, u_id = %u_id, "User created");

    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie(&token, state.config.secure_cookies())),
        Json(AuthResponse {
            message: "User created successfully",
            user: profile.for_response(),
            token,
        }),
    ))
}

/// Authenticate by username and password.
async fn signin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    body: std::result::Result<Json<SignInRequest>, JsonRejection>,
) -> Result<AuthReply> {
    let request = json_body(body)?;
    validate_request(&request)?;

    let username = first_letter_uppercase(&request.username);

    // Unknown user and wrong password are indistinguishable to the client.
    let auth = state
        .auth_store
        .find_by_username(&username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !compare_password(auth.clone(), request.password).await? {
        tracing::info!(auth_id = %auth.id, "Signin rejected: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let profile = state
        .user_store
        .find_by_auth_id(&auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))?;

    let token = sign_token(
        &AuthPayload::for_user(&auth, &profile.id),
        &state.config.jwt_token,
    )?;

    if let Some(recipient) = &state.config.signin_notice_recipient {
        let template = password_reset_confirmation(&ResetPasswordParams {
            username: auth.username.clone(),
            email: auth.email.clone(),
            ipaddress: client_ip(&headers),
            date: Utc::now(),
        });
        state
            .job_queue
            .add_job(Job::ForgotPasswordEmail(EmailJob {
                template,
                receiver_email: recipient.clone(),
                subject: "Password reset confirmation".to_string(),
            }))
            .await?;
    }

    tracing::info!(user_id = %profile.id, "User signed in");

    let user = profile.merged_with(&auth).for_response();
    Ok((
        StatusCode::OK,
        jar.add(session_cookie(&token, state.config.secure_cookies())),
        Json(AuthResponse {
            message: "User login successfully",
            user,
            token,
        }),
    ))
}

/// Clear the session.
async fn signout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (StatusCode, CookieJar, Json<AuthResponse<serde_json::Value>>) {
    (
        StatusCode::OK,
        jar.add(removal_cookie(state.config.secure_cookies())),
        Json(AuthResponse {
            message: "Logout successful",
            user: serde_json::json!({}),
            token: String::new(),
        }),
    )
}

/// First address in `X-Forwarded-For`, as set by the load balancer.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown")
        .to_string()
}
