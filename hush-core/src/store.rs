use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use time::OffsetDateTime;
use tokio::sync::watch;

use crate::config::StoreConfig;
use crate::record::{Secret, SecretRecord};

/// Error type for create operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CreateError {
    /// The requested view limit was zero
    #[error("max_views must be greater than zero")]
    ZeroMaxViews,
}

/// Error type for consume operations
///
/// All variants surface to clients identically as "not found"; they are
/// distinguished only so the caller can log why a read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConsumeError {
    /// No record exists under the key
    #[error("no secret stored under this key")]
    Missing,
    /// The record exists but every view has been consumed
    #[error("view limit exhausted")]
    ViewsExhausted,
    /// The record exists but its time-to-live has elapsed
    #[error("time-to-live elapsed")]
    Expired,
}

impl ConsumeError {
    /// Stable label for log lines
    pub fn reason(&self) -> &'static str {
        match self {
            ConsumeError::Missing => "absent",
            ConsumeError::ViewsExhausted => "view_exhausted",
            ConsumeError::Expired => "expired",
        }
    }
}

/// Cap accepted TTLs at ~100 years of minutes so expiry arithmetic stays
/// inside `OffsetDateTime`'s representable range.
const MAX_TTL_MINUTES: u32 = 100 * 365 * 24 * 60;

/// Internal shared state for the store
struct StoreInner {
    records: DashMap<String, SecretRecord>,
    /// Sender to signal shutdown to the reaper task
    shutdown_tx: watch::Sender<bool>,
}

/// Thread-safe in-memory secret store with view-count and TTL expiry
///
/// Uses `DashMap` for concurrent access. A read holds the map's per-shard
/// write lock across its check-then-decrement, so two concurrent reads can
/// never both consume the same last view.
///
/// Retrieval keys are a deterministic hash of the secret text: submitting
/// identical text twice yields the same key, and the second submission
/// overwrites the first record's view and TTL state.
///
/// Expiration is lazy: a record past either of its limits fails every read
/// but stays in the map. Each store spawns a background reaper task that
/// periodically removes such dead records; the task stops when the store is
/// dropped.
///
/// # Example
///
/// ```rust,no_run
/// use hush_core::{Store, StoreConfig};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let config = StoreConfig::default()
///         .with_reap_interval(Duration::from_secs(30));
///     let store = Store::with_config(config);
///
///     // One read allowed, valid for 5 minutes
///     let secret = store.create("s3cr3t", 1, 5).unwrap();
///     let read = store.consume(&secret.key).unwrap();
///     assert_eq!(read.remaining_views, 0);
/// }
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Creates a new store with default configuration
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context. The store requires
    /// a runtime to spawn its background reaper task.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates a new store with custom configuration
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context. The store requires
    /// a runtime to spawn its background reaper task.
    pub fn with_config(config: StoreConfig) -> Self {
        // Verify that a Tokio runtime is available before proceeding.
        // This provides a clear error message instead of a cryptic panic from tokio::spawn.
        if tokio::runtime::Handle::try_current().is_err() {
            panic!(
                "hush_core::Store requires a Tokio runtime. \
                 Ensure you are calling Store::new() or Store::with_config() \
                 from within a #[tokio::main] or #[tokio::test] context, \
                 or from code running on a Tokio runtime."
            );
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let inner = Arc::new(StoreInner {
            records: DashMap::new(),
            shutdown_tx,
        });

        // Spawn the background reaper task
        let reaper_inner = Arc::clone(&inner);
        tokio::spawn(Self::reaper_task(
            reaper_inner,
            config.reap_interval,
            shutdown_rx,
        ));

        Self { inner }
    }

    /// Background task that periodically removes dead records
    async fn reaper_task(
        inner: Arc<StoreInner>,
        interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        // Skip the first immediate tick - we want to wait for the interval first
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    Self::reap_internal(&inner);
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        // Shutdown signal received
                        break;
                    }
                }
            }
        }
    }

    /// Internal reap logic (shared between manual and background reaping)
    fn reap_internal(inner: &StoreInner) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut removed_count = 0;

        inner.records.retain(|_, record| {
            if record.is_dead(now) {
                removed_count += 1;
                false
            } else {
                true
            }
        });

        removed_count
    }

    /// Derives the retrieval key from the secret text
    ///
    /// A fast non-cryptographic 64-bit hash rendered as a fixed-width hex
    /// string. Deterministic within a process run, which is all an in-memory
    /// store needs.
    fn derive_key(text: &str) -> String {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    /// Stores a secret with the given view limit and TTL in minutes
    ///
    /// The retrieval key is derived from `text`, so creating the same text
    /// twice returns the same key and the second call overwrites the first
    /// record's remaining-view and TTL state.
    ///
    /// # TTL Semantics
    ///
    /// - **TTL of 0** means the record **never expires by time**; only the
    ///   view limit applies.
    /// - **Non-zero TTL** is the time-to-live in minutes, capped at ~100
    ///   years to keep expiry timestamps representable.
    ///
    /// # Errors
    ///
    /// Returns `CreateError::ZeroMaxViews` if `max_views` is zero; nothing is
    /// stored in that case.
    pub fn create(
        &self,
        text: impl Into<Arc<str>>,
        max_views: u32,
        ttl_minutes: u32,
    ) -> Result<Secret, CreateError> {
        if max_views == 0 {
            return Err(CreateError::ZeroMaxViews);
        }
        Ok(self.install(text.into(), max_views, ttl_minutes, OffsetDateTime::now_utc()))
    }

    fn install(
        &self,
        text: Arc<str>,
        max_views: u32,
        ttl_minutes: u32,
        created_at: OffsetDateTime,
    ) -> Secret {
        let key = Self::derive_key(&text);
        let record = SecretRecord::new(
            text,
            max_views,
            ttl_minutes.min(MAX_TTL_MINUTES),
            created_at,
        );
        let snapshot = record.snapshot(&key);
        self.inner.records.insert(key, record);
        snapshot
    }

    /// Stores a secret with an arbitrary creation time (for testing expiry)
    #[cfg(test)]
    fn create_backdated(
        &self,
        text: &str,
        max_views: u32,
        ttl_minutes: u32,
        created_at: OffsetDateTime,
    ) -> Secret {
        self.install(Arc::from(text), max_views, ttl_minutes, created_at)
    }

    /// Reads a secret by key, consuming one view
    ///
    /// The whole check-then-decrement runs under the key's shard write lock:
    /// under concurrent calls on the same key, exactly one caller wins the
    /// last view. The returned snapshot reflects the state **after** the
    /// decrement.
    ///
    /// # Errors
    ///
    /// Returns a `ConsumeError` naming why the read failed; the record is
    /// left untouched in every error case. Wall-clock time is read once at
    /// entry and not re-checked.
    pub fn consume(&self, key: &str) -> Result<Secret, ConsumeError> {
        let now = OffsetDateTime::now_utc();

        let mut record = self
            .inner
            .records
            .get_mut(key)
            .ok_or(ConsumeError::Missing)?;

        if record.is_exhausted() {
            return Err(ConsumeError::ViewsExhausted);
        }
        if record.is_expired(now) {
            return Err(ConsumeError::Expired);
        }

        record.consume_view();
        Ok(record.snapshot(key))
    }

    /// Manually removes all records that can no longer be read
    ///
    /// Returns the number of records removed. A record is removed only when
    /// every future read against it would already fail, so reaping is never
    /// observable through `consume`.
    ///
    /// Note: This is also done automatically by the background task.
    pub fn reap(&self) -> usize {
        Self::reap_internal(&self.inner)
    }

    /// Returns the number of records in the store (including dead ones)
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.records.len()
    }

    /// Returns `true` if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.records.is_empty()
    }

    /// Gracefully shuts down the background reaper task
    ///
    /// This is called automatically when the store is dropped,
    /// but can be called manually if needed.
    pub fn shutdown(&self) {
        let _ = self.inner.shutdown_tx.send(true);
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        // Signal the reaper task to stop when the store is dropped
        let _ = self.shutdown_tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Barrier;
    use std::thread;
    use time::Duration as TimeDuration;

    /// Helper to create a store within a tokio runtime for tests
    fn create_test_store() -> Store {
        create_test_store_with_config(StoreConfig::default())
    }

    fn create_test_store_with_config(config: StoreConfig) -> Store {
        // Create a runtime for the background task
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();

        // Keep the runtime alive by leaking it (fine for tests)
        let rt = Box::leak(Box::new(rt));
        let _guard = rt.enter();

        Store::with_config(config)
    }

    #[test]
    fn test_create_and_consume() {
        let store = create_test_store();
        let created = store.create("hello", 2, 0).unwrap();

        assert_eq!(&*created.text, "hello");
        assert_eq!(created.remaining_views, 2);
        assert_eq!(created.expires_at, None);

        let first = store.consume(&created.key).unwrap();
        assert_eq!(&*first.text, "hello");
        assert_eq!(first.remaining_views, 1);

        let second = store.consume(&created.key).unwrap();
        assert_eq!(second.remaining_views, 0);

        assert_eq!(
            store.consume(&created.key),
            Err(ConsumeError::ViewsExhausted)
        );
        assert_eq!(store.consume("unknown-key"), Err(ConsumeError::Missing));
    }

    #[test]
    fn test_single_view_exhaustion() {
        let store = create_test_store();
        let created = store.create("once", 1, 0).unwrap();

        let read = store.consume(&created.key).unwrap();
        assert_eq!(read.remaining_views, 0);

        assert_eq!(
            store.consume(&created.key),
            Err(ConsumeError::ViewsExhausted)
        );
    }

    #[test]
    fn test_zero_max_views_rejected() {
        let store = create_test_store();

        assert_eq!(
            store.create("nobody may read this", 0, 5),
            Err(CreateError::ZeroMaxViews)
        );
        // Nothing was stored
        assert!(store.is_empty());
    }

    #[test]
    fn test_time_expiration() {
        let store = create_test_store();
        let created_at = OffsetDateTime::now_utc() - TimeDuration::minutes(10);

        // TTL already elapsed, views untouched
        let expired = store.create_backdated("stale", 1000, 5, created_at);
        assert_eq!(store.consume(&expired.key), Err(ConsumeError::Expired));

        // Same age but a longer TTL is still readable
        let fresh = store.create_backdated("fresh", 1000, 30, created_at);
        let read = store.consume(&fresh.key).unwrap();
        assert_eq!(read.remaining_views, 999);
    }

    #[test]
    fn test_expired_record_left_untouched() {
        let store = create_test_store();
        let created_at = OffsetDateTime::now_utc() - TimeDuration::minutes(10);
        let secret = store.create_backdated("stale", 3, 5, created_at);

        // Repeated failed reads keep reporting expiry, not exhaustion
        for _ in 0..3 {
            assert_eq!(store.consume(&secret.key), Err(ConsumeError::Expired));
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let store = create_test_store();
        // Created ten years ago with no time limit
        let created_at = OffsetDateTime::now_utc() - TimeDuration::days(365 * 10);
        let secret = store.create_backdated("durable", 3, 0, created_at);

        let read = store.consume(&secret.key).unwrap();
        assert_eq!(read.remaining_views, 2);
        assert_eq!(read.expires_at, None);
    }

    #[test]
    fn test_extreme_ttl_does_not_panic() {
        let store = create_test_store();
        // TTL is capped internally
        let secret = store.create("patient", 1, u32::MAX).unwrap();
        assert!(secret.expires_at.is_some());
        assert!(store.consume(&secret.key).is_ok());
    }

    #[test]
    fn test_key_is_deterministic() {
        let store = create_test_store();

        let first = store.create("same text", 1, 0).unwrap();
        let second = store.create("same text", 5, 0).unwrap();
        assert_eq!(first.key, second.key);

        let other = store.create("different text", 1, 0).unwrap();
        assert_ne!(first.key, other.key);
    }

    #[test]
    fn test_resubmission_overwrites_state() {
        let store = create_test_store();

        let first = store.create("same text", 1, 0).unwrap();
        let _ = store.consume(&first.key).unwrap();
        assert_eq!(store.consume(&first.key), Err(ConsumeError::ViewsExhausted));

        // Re-submitting identical text resets the record under the same key
        let second = store.create("same text", 5, 0).unwrap();
        assert_eq!(second.key, first.key);
        assert_eq!(store.len(), 1);

        let read = store.consume(&second.key).unwrap();
        assert_eq!(read.remaining_views, 4);
    }

    #[test]
    fn test_concurrent_consumption_exactly_n_succeed() {
        const VIEWS: u32 = 8;
        const CALLERS: usize = 32;

        let store = Arc::new(create_test_store());
        let secret = store.create("contested", VIEWS, 0).unwrap();
        let barrier = Arc::new(Barrier::new(CALLERS));

        let mut handles = vec![];
        for _ in 0..CALLERS {
            let store = Arc::clone(&store);
            let key = secret.key.clone();
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                store.consume(&key)
            }));
        }

        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("Thread panicked"))
            .collect();

        let successes: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        let failures = results.iter().filter(|r| r.is_err()).count();

        assert_eq!(successes.len(), VIEWS as usize);
        assert_eq!(failures, CALLERS - VIEWS as usize);

        // Every successful read observed a distinct post-decrement count,
        // so no view was ever double-counted
        let observed: HashSet<u32> = successes.iter().map(|s| s.remaining_views).collect();
        let expected: HashSet<u32> = (0..VIEWS).collect();
        assert_eq!(observed, expected);

        for result in &results {
            assert!(matches!(
                result,
                Ok(_) | Err(ConsumeError::ViewsExhausted)
            ));
        }
    }

    #[test]
    fn test_concurrent_creates_distinct_texts() {
        let store = Arc::new(create_test_store());
        let mut handles = vec![];

        // Spawn 10 threads, each storing 100 distinct secrets
        for thread_id in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    let text = format!("thread{}:secret{}", thread_id, i);
                    store.create(text, 1, 0).unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        assert_eq!(store.len(), 1000);
    }

    #[test]
    fn test_reap_removes_only_dead_records() {
        // Use a long reap interval to keep the background task out of the way
        let config = StoreConfig::default().with_reap_interval(Duration::from_secs(3600));
        let store = create_test_store_with_config(config);
        let past = OffsetDateTime::now_utc() - TimeDuration::minutes(10);

        let expired = store.create_backdated("expired", 5, 5, past);
        let exhausted = store.create("exhausted", 1, 0).unwrap();
        let _ = store.consume(&exhausted.key).unwrap();
        let alive = store.create("alive", 2, 30).unwrap();

        assert_eq!(store.len(), 3);
        let removed = store.reap();
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);

        // Reaping flips dead records' failure reason to absent, and nothing else
        assert_eq!(store.consume(&expired.key), Err(ConsumeError::Missing));
        assert_eq!(store.consume(&exhausted.key), Err(ConsumeError::Missing));
        let read = store.consume(&alive.key).unwrap();
        assert_eq!(read.remaining_views, 1);
    }

    #[test]
    fn test_reap_empty_store() {
        let store = create_test_store();
        assert_eq!(store.reap(), 0);
    }

    #[tokio::test]
    async fn test_background_reaper_runs() {
        // Create store with very short reap interval
        let config = StoreConfig::default().with_reap_interval(Duration::from_millis(50));
        let store = Store::with_config(config);

        let past = OffsetDateTime::now_utc() - TimeDuration::minutes(10);
        store.create_backdated("gone1", 1, 5, past);
        store.create_backdated("gone2", 1, 5, past);
        store.create("kept", 1, 0).unwrap();

        // Initially all 3 records exist (even if dead)
        assert_eq!(store.len(), 3);

        // Wait for background reaping to run (interval + some buffer)
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.len(), 1);
        assert!(store.consume("kept-is-not-a-key").is_err());
        let read = store.consume(&Store::derive_key("kept")).unwrap();
        assert_eq!(&*read.text, "kept");
    }

    #[tokio::test]
    async fn test_shutdown_stops_reaper() {
        let config = StoreConfig::default().with_reap_interval(Duration::from_millis(10));
        let store = Store::with_config(config);

        let past = OffsetDateTime::now_utc() - TimeDuration::minutes(10);
        store.create_backdated("dead", 1, 5, past);

        store.shutdown();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The reaper no longer runs, so the dead record is still present
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_store_clone_shares_data() {
        let store1 = Store::new();
        let store2 = store1.clone();

        let secret = store1.create("shared", 2, 0).unwrap();

        // Both handles see the same record, and views are shared
        let read = store2.consume(&secret.key).unwrap();
        assert_eq!(read.remaining_views, 1);
        let read = store1.consume(&secret.key).unwrap();
        assert_eq!(read.remaining_views, 0);
    }

    #[test]
    fn test_len_and_is_empty() {
        let store = create_test_store();

        assert!(store.is_empty());
        assert_eq!(store.len(), 0);

        store.create("something", 1, 0).unwrap();

        assert!(!store.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_exhausted_record_is_retained() {
        let store = create_test_store();
        let secret = store.create("read me once", 1, 0).unwrap();

        let _ = store.consume(&secret.key).unwrap();

        // Logically dead, physically retained until reaped
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.consume(&secret.key),
            Err(ConsumeError::ViewsExhausted)
        );
    }
}
