//! # Hush Core
//!
//! An in-memory store for ephemeral secrets. A secret is submitted together
//! with a maximum view count and an optional time-to-live; each successful
//! read consumes one view, and once either limit is hit the secret becomes
//! permanently unreadable.
//!
//! ## Features
//!
//! - Thread-safe storage using `DashMap`; the check-then-decrement on read is
//!   serialized per key, so views are never double-counted
//! - Lazy expiration on read, plus a background reaper task per store
//!   instance that removes records no read could ever succeed against
//! - Retrieval keys derived deterministically from the secret text
//!
//! ## Example
//!
//! ```rust,no_run
//! use hush_core::{Store, StoreConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Create store with default config (60 second reap interval)
//!     let store = Store::new();
//!
//!     // Or with a custom reap interval
//!     let config = StoreConfig::default()
//!         .with_reap_interval(Duration::from_secs(30));
//!     let store = Store::with_config(config);
//!
//!     // Store a secret readable twice within the next 10 minutes
//!     let secret = store.create("the launch code", 2, 10).unwrap();
//!
//!     // Each read consumes one view
//!     if let Ok(secret) = store.consume(&secret.key) {
//!         println!("{} views left", secret.remaining_views);
//!     }
//! }
//! ```

mod config;
mod record;
mod store;

pub use config::StoreConfig;
pub use record::{Secret, SecretRecord};
pub use store::{ConsumeError, CreateError, Store};
