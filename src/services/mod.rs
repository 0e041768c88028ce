// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - collaborators behind the request handlers.

pub mod assets;
pub mod email;
pub mod queue;
pub mod templates;
pub mod worker;

pub use assets::{AssetUploader, CloudinaryUploader, DisabledUploader, UploadResult};
pub use email::{EmailSender, MailTransport};
pub use queue::{CloudTasksQueue, InProcessQueue, Job, JobQueue};
pub use worker::JobWorker;
