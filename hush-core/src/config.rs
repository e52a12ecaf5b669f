use std::time::Duration;

/// Configuration for the store's background reaper task
///
/// # Example
///
/// ```rust
/// use hush_core::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_reap_interval(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Interval between reaper runs (default: 60 seconds)
    pub reap_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            reap_interval: Duration::from_secs(60),
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reap interval
    ///
    /// This determines how often the background task runs to remove records
    /// that can no longer be read (exhausted or past their time-to-live).
    ///
    /// # Example
    ///
    /// ```rust
    /// use hush_core::StoreConfig;
    /// use std::time::Duration;
    ///
    /// // Reap every 30 seconds
    /// let config = StoreConfig::default()
    ///     .with_reap_interval(Duration::from_secs(30));
    /// ```
    pub fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }
}
