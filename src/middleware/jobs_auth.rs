// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background job delivery authentication middleware.

use crate::services::queue::{verify_job_signature, JOB_SIGNATURE_HEADER};
use crate::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Largest job body accepted.
const MAX_JOB_BODY_BYTES: usize = 1024 * 1024;

/// Require a valid `x-job-signature` over the body for `/jobs/*` routes.
pub async fn require_job_signature(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();

    let signature = parts
        .headers
        .get(JOB_SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let Some(signature) = signature else {
        tracing::warn!(path = %parts.uri.path(), "Blocked job delivery without signature");
        return Err(StatusCode::FORBIDDEN);
    };

    let bytes = axum::body::to_bytes(body, MAX_JOB_BODY_BYTES)
        .await
        .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE)?;

    if !verify_job_signature(&state.config.job_signing_key, &bytes, &signature) {
        tracing::warn!(path = %parts.uri.path(), "Blocked job delivery with invalid signature");
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next
        .run(Request::from_parts(parts, Body::from(bytes)))
        .await)
}
