// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background job execution.
//!
//! Jobs arrive either over HTTP from Cloud Tasks (`/jobs/<name>`) or from the
//! in-process queue. Every job is an idempotent upsert or a send, so
//! redelivery after a failure is safe.

use crate::db::{AuthStore, UserStore};
use crate::error::Result;
use crate::services::email::EmailSender;
use crate::services::queue::Job;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Attempts per job on the in-process queue.
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Runs queued jobs against the authoritative stores and the mailer.
#[derive(Clone)]
pub struct JobWorker {
    auth_store: Arc<dyn AuthStore>,
    user_store: Arc<dyn UserStore>,
    mailer: Arc<dyn EmailSender>,
}

impl JobWorker {
    pub fn new(
        auth_store: Arc<dyn AuthStore>,
        user_store: Arc<dyn UserStore>,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            auth_store,
            user_store,
            mailer,
        }
    }

    /// Run one job.
    pub async fn process(&self, job: &Job) -> Result<()> {
        match job {
            Job::AddAuthUserToDb(record) => {
                self.auth_store.insert_auth_user(record).await?;
                tracing::info!(auth_id = %record.id, "Auth user saved");
            }
            Job::AddUserToDb(profile) => {
                self.user_store.insert_user(profile).await?;
                tracing::info!(user_id = %profile.id, "User profile saved");
            }
            Job::ForgotPasswordEmail(email) => {
                self.mailer
                    .send(&email.receiver_email, &email.subject, &email.template)
                    .await?;
                tracing::info!(subject = %email.subject, "Email sent");
            }
        }
        Ok(())
    }

    /// Drain an in-process queue until every sender is dropped.
    pub fn spawn_in_process(self, mut receiver: mpsc::UnboundedReceiver<Job>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                self.process_with_retry(&job).await;
            }
            tracing::info!("In-process job queue closed");
        })
    }

    async fn process_with_retry(&self, job: &Job) {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.process(job).await {
                Ok(()) => return,
                Err(e) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(job = job.name(), attempt, error = %e, "Job failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => {
                    tracing::error!(job = job.name(), attempt, error = %e, "Job failed, giving up");
                }
            }
        }
    }
}
