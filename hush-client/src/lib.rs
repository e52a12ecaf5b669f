//! # Hush Client
//!
//! A small typed client for the hush ephemeral secret service.
//!
//! Secrets are submitted with a view limit and an optional time-to-live in
//! minutes; the service answers with a retrieval hash. Each fetch consumes
//! one view, and a secret past either limit reads as absent.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hush_client::HushClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hush_client::Error> {
//!     let client = HushClient::new("http://localhost:8080")?;
//!
//!     // Store a secret readable once within the next 10 minutes
//!     let created = client.create_secret("the launch code", 1, 10).await?;
//!
//!     // Read it back (this consumes the only view)
//!     if let Some(secret) = client.fetch_secret(&created.hash).await? {
//!         println!("Got: {}", secret.secret_text);
//!     }
//!
//!     // A second read finds nothing
//!     assert!(client.fetch_secret(&created.hash).await?.is_none());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## With Options
//!
//! ```rust,no_run
//! use hush_client::{HushClient, HushClientOptions};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), hush_client::Error> {
//! let options = HushClientOptions::new("http://localhost:8080")
//!     .with_timeout(Duration::from_secs(5));
//! let client = HushClient::with_options(options)?;
//! # Ok(())
//! # }
//! ```

mod error;
mod options;

pub use error::Error;
pub use options::HushClientOptions;

use serde::Deserialize;
use time::OffsetDateTime;

/// A secret as returned by the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    /// Retrieval hash the secret is stored under
    pub hash: String,
    /// The secret text
    pub secret_text: String,
    /// When the secret was created
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the secret expires by time; `None` when it has no time limit
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub expires_at: Option<OffsetDateTime>,
    /// Views still allowed after this response
    pub remaining_views: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// A client for the hush secret service.
///
/// The client is thread-safe and can be cloned cheaply.
#[derive(Clone)]
pub struct HushClient {
    http: reqwest::Client,
    base_url: String,
}

impl HushClient {
    /// Create a client for the given server base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        Self::with_options(HushClientOptions::new(base_url))
    }

    /// Create a client with custom options.
    pub fn with_options(options: HushClientOptions) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: options.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Submit a secret.
    ///
    /// # Arguments
    /// * `text` - The secret text
    /// * `expire_after_views` - How many reads are allowed; must be at least 1
    /// * `expire_after_minutes` - Time-to-live in minutes; 0 means no time limit
    ///
    /// Returns the stored representation, including the retrieval hash.
    pub async fn create_secret(
        &self,
        text: &str,
        expire_after_views: u32,
        expire_after_minutes: u32,
    ) -> Result<Secret, Error> {
        let views = expire_after_views.to_string();
        let ttl = expire_after_minutes.to_string();
        let params = [
            ("secret", text),
            ("expireAfterViews", views.as_str()),
            ("expireAfter", ttl.as_str()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/secret", self.base_url))
            .form(&params)
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(response.json().await?),
            reqwest::StatusCode::BAD_REQUEST | reqwest::StatusCode::UNPROCESSABLE_ENTITY => {
                Err(Error::Rejected(read_error_message(response).await))
            }
            status => Err(Error::UnexpectedStatus(status)),
        }
    }

    /// Read a secret by hash, consuming one view.
    ///
    /// Returns `None` when the hash is unknown or the secret is no longer
    /// readable (view limit spent or time-to-live elapsed — the service does
    /// not say which).
    pub async fn fetch_secret(&self, hash: &str) -> Result<Option<Secret>, Error> {
        let response = self
            .http
            .get(format!("{}/v1/secret/{}", self.base_url, hash))
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(Some(response.json().await?)),
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status => Err(Error::UnexpectedStatus(status)),
        }
    }

    /// Check whether the server is up.
    pub async fn health(&self) -> Result<bool, Error> {
        let response = self
            .http
            .get(format!("{}/healthz", self.base_url))
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

async fn read_error_message(response: reqwest::Response) -> String {
    match response.json::<ErrorBody>().await {
        Ok(body) => body
            .error
            .or(body.message)
            .unwrap_or_else(|| "request rejected".to_string()),
        Err(_) => "request rejected".to_string(),
    }
}
