// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use chatty_auth::cache::{backend::LocalStore, CacheBackend, UserCache};
use chatty_auth::config::Config;
use chatty_auth::db::{FirestoreDb, MemoryDb};
use chatty_auth::error::{AppError, Result};
use chatty_auth::routes::create_router;
use chatty_auth::services::{
    AssetUploader, EmailSender, InProcessQueue, Job, JobWorker, UploadResult,
};
use chatty_auth::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Uploader returning a fixed version, or failing when told to.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeUploader {
    pub fail: AtomicBool,
    pub uploads: Mutex<Vec<String>>,
}

#[async_trait]
impl AssetUploader for FakeUploader {
    async fn upload(
        &self,
        _file: &str,
        public_id: &str,
        _overwrite: bool,
        _invalidate: bool,
    ) -> Result<UploadResult> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Upload("no public_id".to_string()));
        }
        self.uploads.lock().unwrap().push(public_id.to_string());
        Ok(UploadResult {
            public_id: public_id.to_string(),
            version: "1700000000".to_string(),
        })
    }
}

/// Mailer that records what it was asked to send.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, receiver_email: &str, subject: &str, _html: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((receiver_email.to_string(), subject.to_string()));
        Ok(())
    }
}

/// Everything a test may want to poke at behind the router.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: MemoryDb,
    pub cache_store: Arc<LocalStore>,
    pub uploader: Arc<FakeUploader>,
    pub mailer: Arc<RecordingMailer>,
    /// Jobs enqueued by handlers, not yet run
    pub jobs: UnboundedReceiver<Job>,
}

/// Create a test app with in-process fakes for every collaborator.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> TestApp {
    let db = MemoryDb::new();
    let cache_store = Arc::new(LocalStore::default());
    let uploader = Arc::new(FakeUploader::default());
    let mailer = Arc::new(RecordingMailer::default());
    let (queue, jobs) = InProcessQueue::new();

    let state = Arc::new(AppState {
        config,
        auth_store: Arc::new(db.clone()),
        user_store: Arc::new(db.clone()),
        user_cache: UserCache::new(CacheBackend::Local(cache_store.clone())),
        job_queue: Arc::new(queue),
        uploader: uploader.clone(),
        worker: JobWorker::new(
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            mailer.clone(),
        ),
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        cache_store,
        uploader,
        mailer,
        jobs,
    }
}

impl TestApp {
    /// Run every queued job through the worker, as the background queue would.
    #[allow(dead_code)]
    pub async fn drain_jobs(&mut self) -> Vec<&'static str> {
        let mut names = Vec::new();
        while let Ok(job) = self.jobs.try_recv() {
            names.push(job.name());
            self.state.worker.process(&job).await.unwrap();
        }
        names
    }
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn signup_body(username: &str, email: &str) -> serde_json::Value {
    serde_json::json!({
        "username": username,
        "password": "qwerty",
        "email": email,
        "avatarColor": "#9c27b0",
        "avatarImage": "data:image/png;base64,iVBORw0KGgo="
    })
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// `name=value` of the session cookie set by a response.
#[allow(dead_code)]
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
}
