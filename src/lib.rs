// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chatty-Auth: sign-up, sign-in and session handling for the Chatty social app
//!
//! This crate provides the authentication API. New users are served from the
//! user cache immediately while background jobs write them to the
//! authoritative store.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod helpers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod validation;

use cache::UserCache;
use config::Config;
use db::{AuthStore, UserStore};
use services::{AssetUploader, JobQueue, JobWorker};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth_store: Arc<dyn AuthStore>,
    pub user_store: Arc<dyn UserStore>,
    pub user_cache: UserCache,
    pub job_queue: Arc<dyn JobQueue>,
    pub uploader: Arc<dyn AssetUploader>,
    /// Runs jobs delivered to `/jobs/<name>`
    pub worker: JobWorker,
}
