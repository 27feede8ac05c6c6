//! Resource cache facades.
//!
//! Each facade is a stateless key function plus a default lifetime over the
//! shared [`TtlStore`]. Two facades built from the same store see the same
//! entries; only the key decides which slot is read.

mod courses;
mod progress;
mod users;
mod videos;

pub use courses::CourseCache;
pub use progress::ProgressCache;
pub use users::UserCache;
pub use videos::VideoCache;

use std::marker::PhantomData;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheKey, Resource, Snapshot, TtlStore};
use crate::models::Record;

/// Typed view of the store for one record type.
pub struct ResourceCache<T> {
    store: TtlStore,
    ttl: Duration,
    _records: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ttl: self.ttl,
            _records: PhantomData,
        }
    }
}

impl<T: Record> ResourceCache<T> {
    pub fn new(store: TtlStore, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            _records: PhantomData,
        }
    }

    pub fn resource(&self) -> Resource {
        T::RESOURCE
    }

    /// Default lifetime for live entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &CacheKey) -> Option<Snapshot<T>> {
        self.store.get(key)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.store.contains(key)
    }

    /// Store live records under the default lifetime.
    pub fn set(&self, key: &CacheKey, records: Vec<T>) {
        self.store.set(key, Snapshot::live(records), self.ttl);
    }

    /// Store placeholder records under the (shorter) fallback lifetime.
    pub fn set_fallback(&self, key: &CacheKey, records: Vec<T>, ttl: Duration) {
        debug!("Caching {} fallback record(s) under {} for {:?}", records.len(), key, ttl);
        self.store.set(key, Snapshot::fallback(records), ttl);
    }

    /// Drop every entry of this resource whose first key part is `scope_id`.
    pub fn invalidate_scope(&self, scope_id: &str) -> usize {
        let resource = T::RESOURCE;
        self.store
            .delete_matching(|key| CacheKey::in_scope(key, resource, scope_id))
    }
}

impl<T> std::fmt::Debug for ResourceCache<T>
where
    T: Record,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("resource", &T::RESOURCE)
            .field("ttl", &self.ttl)
            .finish()
    }
}
