// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound email.
//!
//! Production sends through the SendGrid HTTP API; development relays through
//! an SMTP server (Ethereal by default).

use crate::config::Config;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde_json::json;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Sends a rendered HTML email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, receiver_email: &str, subject: &str, html: &str) -> Result<()>;
}

/// Email sender selected from configuration.
pub struct MailTransport {
    http_client: reqwest::Client,
    sender_email: String,
    sender_password: Option<String>,
    smtp_host: String,
    smtp_port: u16,
    sendgrid_api_key: Option<String>,
}

impl MailTransport {
    pub fn from_config(config: &Config) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            sender_email: config.sender_email.clone(),
            sender_password: config.sender_email_password.clone(),
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            sendgrid_api_key: config.sendgrid_api_key.clone(),
        }
    }

    fn from_header(&self) -> String {
        format!("Chatty App <{}>", self.sender_email)
    }

    async fn send_sendgrid(
        &self,
        api_key: &str,
        receiver_email: &str,
        subject: &str,
        html: &str,
    ) -> Result<()> {
        let body = json!({
            "personalizations": [{
                "to": [{"email": receiver_email}]
            }],
            "from": {"email": self.sender_email, "name": "Chatty App"},
            "subject": subject,
            "content": [{
                "type": "text/html",
                "value": html
            }]
        });

        let response = self
            .http_client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(AppError::Email(format!("SendGrid returned {}: {}", status, error)));
        }

        tracing::info!("Production email sent successfully");
        Ok(())
    }

    async fn send_smtp(&self, receiver_email: &str, subject: &str, html: &str) -> Result<()> {
        let email = Message::builder()
            .from(
                self.from_header()
                    .parse()
                    .map_err(|e| AppError::Email(format!("Invalid from: {}", e)))?,
            )
            .to(receiver_email
                .parse()
                .map_err(|e| AppError::Email(format!("Invalid to: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| AppError::Email(e.to_string()))?;

        let mut mailer_builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp_host)
            .map_err(|e| AppError::Email(e.to_string()))?
            .port(self.smtp_port);

        if let Some(password) = &self.sender_password {
            mailer_builder = mailer_builder
                .credentials(Credentials::new(self.sender_email.clone(), password.clone()));
        }

        mailer_builder
            .build()
            .send(email)
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        tracing::info!("Development email sent successfully");
        Ok(())
    }
}

#[async_trait]
impl EmailSender for MailTransport {
    async fn send(&self, receiver_email: &str, subject: &str, html: &str) -> Result<()> {
        match &self.sendgrid_api_key {
            Some(api_key) => {
                self.send_sendgrid(api_key, receiver_email, subject, html)
                    .await
            }
            None => self.send_smtp(receiver_email, subject, html).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_header_names_the_app() {
        let transport = MailTransport::from_config(&Config::test_default());
        assert_eq!(transport.from_header(), "Chatty App <sender@example.com>");
    }

    #[tokio::test]
    async fn invalid_receiver_is_an_email_error() {
        let transport = MailTransport::from_config(&Config::test_default());
        let err = transport
            .send("not an address", "Subject", "<p>body</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Email(_)));
    }
}
