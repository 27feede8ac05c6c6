//! Progress cache, keyed by user and the set of requested courses.

use std::time::Duration;

use super::ResourceCache;
use crate::cache::{CacheKey, Resource, Snapshot, TtlStore};
use crate::models::Progress;

#[derive(Debug, Clone)]
pub struct ProgressCache {
    inner: ResourceCache<Progress>,
}

impl ProgressCache {
    pub fn new(store: TtlStore, ttl: Duration) -> Self {
        Self {
            inner: ResourceCache::new(store, ttl),
        }
    }

    pub fn entries(&self) -> &ResourceCache<Progress> {
        &self.inner
    }

    /// Course ids are sorted and de-duplicated first, so the same set in any
    /// order maps to one key.
    pub fn key<S: AsRef<str>>(user_id: &str, course_ids: &[S]) -> CacheKey {
        let mut ids: Vec<&str> = course_ids.iter().map(|id| id.as_ref()).collect();
        ids.sort_unstable();
        ids.dedup();

        CacheKey::new(Resource::Progress, std::iter::once(user_id).chain(ids))
    }

    pub fn get<S: AsRef<str>>(
        &self,
        user_id: &str,
        course_ids: &[S],
    ) -> Option<Snapshot<Progress>> {
        self.inner.get(&Self::key(user_id, course_ids))
    }

    pub fn set<S: AsRef<str>>(&self, user_id: &str, course_ids: &[S], rows: Vec<Progress>) {
        self.inner.set(&Self::key(user_id, course_ids), rows);
    }
}
