// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background job delivery endpoint tests.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chatty_auth::models::AuthRecord;
use chatty_auth::services::queue::{sign_job_body, Job, JOB_SIGNATURE_HEADER};
use chrono::Utc;
use common::{create_test_app, json_request, signup_body};
use serde_json::json;
use tower::ServiceExt; // for oneshot

fn delivery(job_name: &str, body: &[u8], signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/jobs/{}", job_name))
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header(JOB_SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body.to_vec())).unwrap()
}

fn auth_job() -> Job {
    Job::AddAuthUserToDb(AuthRecord {
        id: "65a1f0c2e4b0a1b2c3d4e5f6".to_string(),
        u_id: "123456789012".to_string(),
        username: "Danny".to_string(),
        email: "danny@me.com".to_string(),
        password: "$argon2id$hash".to_string(),
        avatar_color: "red".to_string(),
        created_at: Utc::now(),
    })
}

#[tokio::test]
async fn test_signed_job_runs() {
    let app = create_test_app();
    let job = auth_job();
    let body = job.payload().unwrap();
    let signature = sign_job_body(&app.state.config.job_signing_key, &body).unwrap();

    let response = app
        .router
        .clone()
        .oneshot(delivery(job.name(), &body, Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.db.auth_count(), 1);
}

#[tokio::test]
async fn test_missing_signature_forbidden() {
    let app = create_test_app();
    let job = auth_job();

    let response = app
        .router
        .clone()
        .oneshot(delivery(job.name(), &job.payload().unwrap(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.db.auth_count(), 0);
}

#[tokio::test]
async fn test_wrong_signature_forbidden() {
    let app = create_test_app();
    let job = auth_job();
    let body = job.payload().unwrap();

    for signature in [
        sign_job_body(b"some_other_key", &body).unwrap(),
        sign_job_body(&app.state.config.job_signing_key, b"{}").unwrap(),
        "not-hex".to_string(),
    ] {
        let response = app
            .router
            .clone()
            .oneshot(delivery(job.name(), &body, Some(&signature)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    assert_eq!(app.db.auth_count(), 0);
}

#[tokio::test]
async fn test_unknown_or_malformed_job_is_bad_request() {
    let app = create_test_app();
    let key = app.state.config.job_signing_key.clone();

    let body = json!({ "value": 1 }).to_string().into_bytes();
    for name in ["deleteEverything", "addUserToDB"] {
        let signature = sign_job_body(&key, &body).unwrap();
        let response = app
            .router
            .clone()
            .oneshot(delivery(name, &body, Some(&signature)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_queued_signup_jobs_deliver_over_http() {
    let mut app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/signup",
            signup_body("danny", "danny@me.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Deliver each queued job the way Cloud Tasks would
    while let Ok(job) = app.jobs.try_recv() {
        let body = job.payload().unwrap();
        let signature = sign_job_body(&app.state.config.job_signing_key, &body).unwrap();
        let response = app
            .router
            .clone()
            .oneshot(delivery(job.name(), &body, Some(&signature)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.db.auth_count(), 1);
    assert_eq!(app.db.user_count(), 1);

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/signin",
            json!({ "username": "danny", "password": "qwerty" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
