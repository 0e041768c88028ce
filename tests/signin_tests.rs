// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in and sign-out tests against the full router.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chatty_auth::config::Config;
use chatty_auth::session::Session;
use common::{
    body_json, create_test_app, create_test_app_with, json_request, session_cookie, signup_body,
    TestApp,
};
use serde_json::json;
use tower::ServiceExt; // for oneshot

/// Sign up "Danny" and let the background jobs commit.
async fn signed_up(app: &mut TestApp) -> serde_json::Value {
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
    let body = body_json(response).await;
    app.drain_jobs().await;
    body
}

#[tokio::test]
async fn test_signin_succeeds_after_jobs_commit() {
    let mut app = create_test_app();
    let signup = signed_up(&mut app).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/signin",
            json!({ "username": "DANNY", "password": "qwerty" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).expect("session cookie should be set");
    let body = body_json(response).await;

    assert_eq!(body["message"], "User login successfully");
    assert_eq!(body["user"]["_id"], signup["user"]["_id"]);
    assert_eq!(body["user"]["username"], "Danny");
    assert_eq!(body["user"]["authId"], signup["user"]["authId"]);
    assert!(body["user"].get("password").is_none());

    // Same claims sign to the same token
    assert_eq!(body["token"], signup["token"]);

    // Exactly one token, the one in the session
    let encoded = cookie.strip_prefix("session=").unwrap();
    let session = Session::decode(encoded).expect("cookie should hold a session");
    assert_eq!(session.jwt, body["token"].as_str().unwrap());
}

#[tokio::test]
async fn test_invalid_credentials_are_indistinguishable() {
    let mut app = create_test_app();
    signed_up(&mut app).await;

    let mut messages = Vec::new();
    for body in [
        json!({ "username": "danny", "password": "wrong1" }),
        json!({ "username": "nobody", "password": "qwerty" }),
    ] {
        let response = app
            .router
            .clone()
            .oneshot(json_request("POST", "/signin", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(session_cookie(&response).is_none());
        messages.push(body_json(response).await["message"].clone());
    }

    assert_eq!(messages[0], "Invalid credentials");
    assert_eq!(messages[0], messages[1]);
}

#[tokio::test]
async fn test_signin_validates_input() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/signin",
            json!({ "username": "danny", "password": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Password is a required field");
}

#[tokio::test]
async fn test_signin_before_profile_commits() {
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

    // Only the credential job has run
    let auth_job = app.jobs.try_recv().unwrap();
    app.state.worker.process(&auth_job).await.unwrap();

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

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "User profile not found");
}

#[tokio::test]
async fn test_signin_notice_email_only_when_configured() {
    let mut app = create_test_app();
    signed_up(&mut app).await;

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
    assert!(app.jobs.try_recv().is_err());

    let mut config = Config::test_default();
    config.signin_notice_recipient = Some("ops@example.com".to_string());
    let mut app = create_test_app_with(config);
    signed_up(&mut app).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/signin")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", "203.0.113.7")
                .body(Body::from(
                    json!({ "username": "danny", "password": "qwerty" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(app.drain_jobs().await, vec!["forgotPasswordEmail"]);
    assert_eq!(
        *app.mailer.sent.lock().unwrap(),
        vec![(
            "ops@example.com".to_string(),
            "Password reset confirmation".to_string()
        )]
    );
}

#[tokio::test]
async fn test_signout_clears_session() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/signout")
                .header(header::COOKIE, "session=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("session=;"));
    assert!(set_cookie.contains("Max-Age=0"));

    let body = body_json(response).await;
    assert_eq!(body["message"], "Logout successful");
    assert_eq!(body["user"], json!({}));
    assert_eq!(body["token"], "");
}
