//! Cache module - shared TTL store and key derivation.
//!
//! ## Architecture
//!
//! - `TtlStore` - one process-wide map, per-entry TTL, strict expiry on read
//! - `CacheKey` - deterministic `resource:scope...` keys
//! - `CacheSettings` - per-resource lifetimes
//! - `Snapshot` - stored payloads tagged with their `Origin`
//!
//! ## Usage
//!
//! ```rust,ignore
//! let store = TtlStore::new();
//! let key = CacheKey::new(Resource::Videos, ["course-1"]);
//!
//! store.set(&key, Snapshot::live(videos), settings.videos_ttl);
//! let cached: Option<Snapshot<Video>> = store.get(&key);
//! ```

mod config;
mod key;
mod snapshot;
mod store;

pub use config::{CacheSettings, SettingsError};
pub use key::{CacheKey, Resource, Role};
pub use snapshot::{Origin, Snapshot};
pub use store::{StoreStats, TtlStore};
