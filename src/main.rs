// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chatty-Auth API Server
//!
//! Sign-up, sign-in and session endpoints for the Chatty social app.

use chatty_auth::{
    cache::{CacheBackend, UserCache},
    config::Config,
    db::{AuthStore, FirestoreDb, MemoryDb, UserStore},
    services::{
        AssetUploader, CloudTasksQueue, CloudinaryUploader, DisabledUploader, EmailSender,
        InProcessQueue, JobQueue, JobWorker, MailTransport,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Chatty-Auth API");

    let mailer: Arc<dyn EmailSender> = Arc::new(MailTransport::from_config(&config));

    // Authoritative stores and job queue: GCP when a project is configured
    let auth_store: Arc<dyn AuthStore>;
    let user_store: Arc<dyn UserStore>;
    let job_queue: Arc<dyn JobQueue>;
    let mut in_process_jobs = None;

    match &config.gcp_project_id {
        Some(project_id) => {
            let db = FirestoreDb::new(project_id).await?;
            auth_store = Arc::new(db.clone());
            user_store = Arc::new(db);
            job_queue = Arc::new(CloudTasksQueue::new(
                project_id,
                &config.gcp_region,
                &config.job_queue_name,
                &config.worker_url,
                &config.job_signing_key,
            ));
            tracing::info!(
                project = %project_id,
                queue = %config.job_queue_name,
                "Using Firestore and Cloud Tasks"
            );
        }
        None => {
            let db = MemoryDb::new();
            let (queue, receiver) = InProcessQueue::new();
            auth_store = Arc::new(db.clone());
            user_store = Arc::new(db);
            job_queue = Arc::new(queue);
            in_process_jobs = Some(receiver);
            tracing::warn!("GCP_PROJECT_ID not set, using in-memory stores and in-process queue");
        }
    }

    let worker = JobWorker::new(auth_store.clone(), user_store.clone(), mailer);
    if let Some(receiver) = in_process_jobs {
        worker.clone().spawn_in_process(receiver);
    }

    let cache_backend = match &config.redis_url {
        Some(url) => {
            tracing::info!("Using Redis user cache");
            CacheBackend::new_redis(url)?
        }
        None => {
            tracing::warn!("REDIS_HOST not set, using in-process user cache");
            CacheBackend::new_local()
        }
    };

    let uploader: Arc<dyn AssetUploader> = match CloudinaryUploader::from_config(&config) {
        Some(uploader) => Arc::new(uploader),
        None => {
            tracing::warn!("Asset host credentials not set, avatar uploads will fail");
            Arc::new(DisabledUploader)
        }
    };

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        auth_store,
        user_store,
        user_cache: UserCache::new(cache_backend),
        job_queue,
        uploader,
        worker,
    });

    // Build router
    let app = chatty_auth::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chatty_auth=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
