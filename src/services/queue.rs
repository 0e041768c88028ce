// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background job queue.
//!
//! Jobs are fire-and-forget: the request that enqueues a job never waits for
//! it to run. Two backends:
//! - Cloud Tasks, delivering each job as a signed POST to `/jobs/<name>`
//! - an in-process channel drained by [`JobWorker`](super::worker::JobWorker)
//!
//! Job names and payload shapes are a wire contract with the worker.

use crate::error::{AppError, Result};
use crate::models::{AuthRecord, UserProfile};
use async_trait::async_trait;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tokio::sync::{mpsc, OnceCell};

type HmacSha256 = Hmac<Sha256>;

pub const ADD_AUTH_USER_JOB: &str = "addAuthUserToDB";
pub const ADD_USER_JOB: &str = "addUserToDB";
pub const FORGOT_PASSWORD_EMAIL_JOB: &str = "forgotPasswordEmail";

/// Header carrying the hex HMAC-SHA256 of a delivered job body.
pub const JOB_SIGNATURE_HEADER: &str = "x-job-signature";

/// Envelope used by the persistence jobs: `{"value": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuePayload<T> {
    pub value: T,
}

/// Payload of an email job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailJob {
    /// Rendered HTML body
    pub template: String,
    pub receiver_email: String,
    pub subject: String,
}

/// A unit of background work.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    /// Insert the credential record into the authoritative store.
    AddAuthUserToDb(AuthRecord),
    /// Insert the profile into the authoritative store.
    AddUserToDb(UserProfile),
    /// Send an email.
    ForgotPasswordEmail(EmailJob),
}

/// Failure to decode a delivered job.
#[derive(Debug, thiserror::Error)]
pub enum JobDecodeError {
    #[error("Unknown job name: {0}")]
    UnknownJob(String),

    #[error("Malformed job payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl Job {
    /// Wire name of the job.
    pub fn name(&self) -> &'static str {
        match self {
            Job::AddAuthUserToDb(_) => ADD_AUTH_USER_JOB,
            Job::AddUserToDb(_) => ADD_USER_JOB,
            Job::ForgotPasswordEmail(_) => FORGOT_PASSWORD_EMAIL_JOB,
        }
    }

    /// JSON body of the job.
    pub fn payload(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            Job::AddAuthUserToDb(record) => serde_json::to_vec(&ValuePayload { value: record }),
            Job::AddUserToDb(profile) => serde_json::to_vec(&ValuePayload { value: profile }),
            Job::ForgotPasswordEmail(email) => serde_json::to_vec(email),
        }
    }

    /// Decode a job from its wire name and JSON body.
    pub fn from_wire(name: &str, body: &[u8]) -> std::result::Result<Self, JobDecodeError> {
        match name {
            ADD_AUTH_USER_JOB => {
                let payload: ValuePayload<AuthRecord> = serde_json::from_slice(body)?;
                Ok(Job::AddAuthUserToDb(payload.value))
            }
            ADD_USER_JOB => {
                let payload: ValuePayload<UserProfile> = serde_json::from_slice(body)?;
                Ok(Job::AddUserToDb(payload.value))
            }
            FORGOT_PASSWORD_EMAIL_JOB => {
                Ok(Job::ForgotPasswordEmail(serde_json::from_slice(body)?))
            }
            other => Err(JobDecodeError::UnknownJob(other.to_string())),
        }
    }
}

/// Hex HMAC-SHA256 of a job body.
pub fn sign_job_body(key: &[u8], body: &[u8]) -> std::result::Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a job body signature.
pub fn verify_job_signature(key: &[u8], body: &[u8], signature_hex: &str) -> bool {
    match sign_job_body(key, body) {
        Ok(expected) => expected.as_bytes().ct_eq(signature_hex.as_bytes()).into(),
        Err(_) => false,
    }
}

/// Enqueue-only job submission.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Submit a job. Returns once the backend has accepted it, not when it runs.
    async fn add_job(&self, job: Job) -> Result<()>;
}

/// Cloud Tasks queue delivering jobs over HTTP.
pub struct CloudTasksQueue {
    project_id: String,
    location: String,
    queue_name: String,
    worker_url: String,
    signing_key: Vec<u8>,
    client: OnceCell<google_cloud_tasks_v2::client::CloudTasks>,
}

impl CloudTasksQueue {
    pub fn new(
        project_id: &str,
        region: &str,
        queue_name: &str,
        worker_url: &str,
        signing_key: &[u8],
    ) -> Self {
        Self {
            project_id: project_id.to_string(),
            location: region.to_string(),
            queue_name: queue_name.to_string(),
            worker_url: worker_url.trim_end_matches('/').to_string(),
            signing_key: signing_key.to_vec(),
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&google_cloud_tasks_v2::client::CloudTasks> {
        use google_cloud_tasks_v2::client::CloudTasks;

        self.client
            .get_or_try_init(|| async {
                CloudTasks::builder()
                    .build()
                    .await
                    .map_err(|e| AppError::Queue(format!("Cloud Tasks client error: {}", e)))
            })
            .await
    }
}

#[async_trait]
impl JobQueue for CloudTasksQueue {
    async fn add_job(&self, job: Job) -> Result<()> {
        use google_cloud_tasks_v2::model::{HttpRequest, Task};

        let queue_path = format!(
            "projects/{}/locations/{}/queues/{}",
            self.project_id, self.location, self.queue_name
        );

        let body = job
            .payload()
            .map_err(|e| AppError::Queue(format!("JSON error: {}", e)))?;
        let signature = sign_job_body(&self.signing_key, &body)
            .map_err(|e| AppError::Queue(format!("Job signing failed: {}", e)))?;

        let http_request = HttpRequest::default()
            .set_url(format!("{}/jobs/{}", self.worker_url, job.name()))
            .set_http_method("POST")
            .set_body(axum::body::Bytes::from(body))
            .set_headers(std::collections::HashMap::from([
                ("Content-Type".to_string(), "application/json".to_string()),
                (JOB_SIGNATURE_HEADER.to_string(), signature),
            ]));

        let task = Task::default().set_http_request(http_request);

        let _response = self
            .client()
            .await?
            .create_task()
            .set_parent(queue_path)
            .set_task(task)
            .send()
            .await
            .map_err(|e| AppError::Queue(format!("Cloud Tasks create error: {}", e)))?;

        tracing::debug!(job = job.name(), "Queued job");
        Ok(())
    }
}

/// Queue backed by an in-process channel.
#[derive(Clone)]
pub struct InProcessQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl InProcessQueue {
    /// Create the queue and the receiving end for the worker.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Job>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl JobQueue for InProcessQueue {
    async fn add_job(&self, job: Job) -> Result<()> {
        let name = job.name();
        self.sender
            .send(job)
            .map_err(|_| AppError::Queue("In-process worker has stopped".to_string()))?;
        tracing::debug!(job = name, "Queued job");
        Ok(())
    }
}
