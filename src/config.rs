//! Application configuration loaded from environment variables.
//!
//! Every external collaborator is optional except the signing secrets. When a
//! backend is not configured the in-process equivalent is used, which is how
//! local development and the test suite run.

use std::env;

/// Name of the sorted set indexing cached users by external id.
pub const USER_INDEX_KEY: &str = "user";

/// Default Cloud Tasks queue used for background jobs.
pub const DEFAULT_JOB_QUEUE_NAME: &str = "chatty-jobs";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL, used for CORS and cookie attributes
    pub client_url: String,
    /// Secret used to sign session tokens (raw bytes)
    pub jwt_token: Vec<u8>,
    /// Secret used to sign background job deliveries (raw bytes)
    pub job_signing_key: Vec<u8>,

    /// Redis URL for the user cache; in-process cache when absent
    pub redis_url: Option<String>,

    /// GCP project ID; in-memory stores and in-process queue when absent
    pub gcp_project_id: Option<String>,
    pub gcp_region: String,
    pub job_queue_name: String,
    /// Base URL Cloud Tasks delivers jobs to
    pub worker_url: String,

    // --- Asset host ---
    pub cloud_name: Option<String>,
    pub cloud_api_key: Option<String>,
    pub cloud_api_secret: Option<String>,

    // --- Email ---
    pub sender_email: String,
    pub sender_email_password: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sendgrid_api_key: Option<String>,
    /// Fixed recipient of the sign-in confirmation email; not sent when absent
    pub signin_notice_recipient: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
            client_url: env::var("CLIENT_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            jwt_token: env::var("JWT_TOKEN")
                .map_err(|_| ConfigError::Missing("JWT_TOKEN"))?
                .into_bytes(),
            job_signing_key: env::var("JOB_SIGNING_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("JOB_SIGNING_KEY"))?
                .into_bytes(),

            redis_url: optional("REDIS_HOST"),

            gcp_project_id: optional("GCP_PROJECT_ID"),
            gcp_region: env::var("GCP_REGION").unwrap_or_else(|_| "us-central1".to_string()),
            job_queue_name: env::var("JOB_QUEUE_NAME")
                .unwrap_or_else(|_| DEFAULT_JOB_QUEUE_NAME.to_string()),
            worker_url: env::var("WORKER_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),

            cloud_name: optional("CLOUD_NAME"),
            cloud_api_key: optional("CLOUD_API_KEY"),
            cloud_api_secret: optional("CLOUD_API_SECRET"),

            sender_email: env::var("SENDER_EMAIL")
                .unwrap_or_else(|_| "no-reply@localhost".to_string()),
            sender_email_password: optional("SENDER_EMAIL_PASSWORD"),
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.ethereal.email".to_string()),
            smtp_port: env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(587),
            sendgrid_api_key: optional("SENDGRID_API_KEY"),
            signin_notice_recipient: optional("SIGNIN_NOTICE_RECIPIENT"),
        })
    }

    /// Deterministic configuration for tests. No external backends.
    pub fn test_default() -> Self {
        Self {
            port: 5000,
            client_url: "http://localhost:3000".to_string(),
            jwt_token: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            job_signing_key: b"test_job_signing_key".to_vec(),
            redis_url: None,
            gcp_project_id: None,
            gcp_region: "us-central1".to_string(),
            job_queue_name: DEFAULT_JOB_QUEUE_NAME.to_string(),
            worker_url: "http://localhost:5000".to_string(),
            cloud_name: Some("test-cloud".to_string()),
            cloud_api_key: None,
            cloud_api_secret: None,
            sender_email: "sender@example.com".to_string(),
            sender_email_password: None,
            smtp_host: "localhost".to_string(),
            smtp_port: 2525,
            sendgrid_api_key: None,
            signin_notice_recipient: None,
        }
    }

    /// Cookies get the `Secure` attribute when the frontend is served over TLS.
    pub fn secure_cookies(&self) -> bool {
        self.client_url.starts_with("https://")
    }

    /// Public URL of an uploaded avatar.
    pub fn profile_picture_url(&self, version: &str, public_id: &str) -> String {
        format!(
            "https://res.cloudinary.com/{}/image/upload/v{}/{}",
            self.cloud_name.as_deref().unwrap_or_default(),
            version,
            public_id
        )
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_TOKEN", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("JOB_SIGNING_KEY", " job_key ");
        env::set_var("SIGNIN_NOTICE_RECIPIENT", "");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.jwt_token, b"test_jwt_key_32_bytes_minimum!!");
        assert_eq!(config.job_signing_key, b"job_key");
        assert_eq!(config.signin_notice_recipient, None);
    }

    #[test]
    fn test_profile_picture_url() {
        let config = Config::test_default();
        assert_eq!(
            config.profile_picture_url("1700000000", "65a1f0c2e4b0a1b2c3d4e5f6"),
            "https://res.cloudinary.com/test-cloud/image/upload/v1700000000/65a1f0c2e4b0a1b2c3d4e5f6"
        );
    }

    #[test]
    fn test_secure_cookies() {
        let mut config = Config::test_default();
        assert!(!config.secure_cookies());
        config.client_url = "https://chatty.example.com".to_string();
        assert!(config.secure_cookies());
    }
}
