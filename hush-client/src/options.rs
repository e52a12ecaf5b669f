//! Client configuration options.

use std::time::Duration;

/// Options for configuring the hush client.
///
/// # Example
///
/// ```rust
/// use hush_client::HushClientOptions;
/// use std::time::Duration;
///
/// let options = HushClientOptions::new("http://localhost:8080")
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Clone, Debug)]
pub struct HushClientOptions {
    /// The server base URL (e.g., "http://localhost:8080")
    pub base_url: String,

    /// Optional request timeout applied to every call
    pub timeout: Option<Duration>,
}

impl HushClientOptions {
    /// Create new options with the given server base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    /// Set a request timeout applied to every call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Create options from environment variables.
    ///
    /// Reads:
    /// - `HUSH_SERVER_URL` - Server base URL (defaults to "http://127.0.0.1:8080")
    pub fn from_env() -> Self {
        let base_url = std::env::var("HUSH_SERVER_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());

        Self {
            base_url,
            timeout: None,
        }
    }
}

impl Default for HushClientOptions {
    fn default() -> Self {
        Self::new("http://127.0.0.1:8080")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = HushClientOptions::default();
        assert_eq!(options.base_url, "http://127.0.0.1:8080");
        assert!(options.timeout.is_none());
    }

    #[test]
    fn test_with_timeout() {
        let options =
            HushClientOptions::new("http://example.test").with_timeout(Duration::from_secs(5));
        assert_eq!(options.base_url, "http://example.test");
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
    }
}
