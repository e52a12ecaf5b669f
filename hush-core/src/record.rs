use std::sync::Arc;
use time::{Duration, OffsetDateTime};

/// One stored secret and its consumption/expiry state.
///
/// The retrieval key is not duplicated here; records live in the store's map
/// under their key. The text and creation time are immutable after creation,
/// only `remaining_views` changes, and only downward.
#[derive(Debug, Clone)]
pub struct SecretRecord {
    text: Arc<str>,
    created_at: OffsetDateTime,
    ttl_minutes: u32,
    remaining_views: u32,
}

impl SecretRecord {
    pub(crate) fn new(
        text: Arc<str>,
        max_views: u32,
        ttl_minutes: u32,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            text,
            created_at,
            ttl_minutes,
            remaining_views: max_views,
        }
    }

    /// Returns the secret text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the creation timestamp
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Returns the time-to-live in minutes; `0` means no time limit
    pub fn ttl_minutes(&self) -> u32 {
        self.ttl_minutes
    }

    /// Returns how many successful reads are still allowed
    pub fn remaining_views(&self) -> u32 {
        self.remaining_views
    }

    /// Absolute expiry time, or `None` when the record has no time limit
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        (self.ttl_minutes > 0)
            .then(|| self.created_at + Duration::minutes(i64::from(self.ttl_minutes)))
    }

    /// Checks whether the time limit has passed at `now`
    ///
    /// Records with a TTL of zero never expire by time.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        matches!(self.expires_at(), Some(expires) if now >= expires)
    }

    /// Checks whether every view has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.remaining_views == 0
    }

    /// Checks whether no future read can succeed
    ///
    /// Dead records stay in the map until the reaper removes them; a read
    /// against one fails either way.
    pub fn is_dead(&self, now: OffsetDateTime) -> bool {
        self.is_exhausted() || self.is_expired(now)
    }

    /// Consumes one view. Caller must have checked `remaining_views > 0`.
    pub(crate) fn consume_view(&mut self) {
        self.remaining_views -= 1;
    }

    pub(crate) fn snapshot(&self, key: &str) -> Secret {
        Secret {
            key: key.to_owned(),
            text: Arc::clone(&self.text),
            created_at: self.created_at,
            expires_at: self.expires_at(),
            remaining_views: self.remaining_views,
        }
    }
}

/// Immutable snapshot of a record, as returned by store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    /// Retrieval key the record is stored under
    pub key: String,
    /// The secret text (shared with the stored record, zero-copy)
    pub text: Arc<str>,
    /// When the record was created
    pub created_at: OffsetDateTime,
    /// When the record expires by time; `None` when it has no time limit
    pub expires_at: Option<OffsetDateTime>,
    /// Views still allowed at the moment the snapshot was taken
    pub remaining_views: u32,
}
