// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background job delivery endpoint (called by Cloud Tasks).
//!
//! The signature check lives in [`require_job_signature`](crate::middleware::require_job_signature).
//! A non-2xx status makes Cloud Tasks redeliver the job later.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Router,
};
use std::sync::Arc;

use crate::services::queue::Job;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/jobs/{job_name}", post(run_job))
}

async fn run_job(
    State(state): State<Arc<AppState>>,
    Path(job_name): Path<String>,
    body: Bytes,
) -> StatusCode {
    let job = match Job::from_wire(&job_name, &body) {
        Ok(job) => job,
        Err(e) => {
            // Redelivery cannot fix a bad job; drop it.
            tracing::error!(job = %job_name, error = %e, "Rejected job delivery");
            return StatusCode::BAD_REQUEST;
        }
    };

    match state.worker.process(&job).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::error!(job = %job_name, error = %e, "Job failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
