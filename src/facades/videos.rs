//! Per-course video cache.

use std::time::Duration;

use super::ResourceCache;
use crate::cache::{CacheKey, Resource, Snapshot, TtlStore};
use crate::models::Video;

#[derive(Debug, Clone)]
pub struct VideoCache {
    inner: ResourceCache<Video>,
}

impl VideoCache {
    pub fn new(store: TtlStore, ttl: Duration) -> Self {
        Self {
            inner: ResourceCache::new(store, ttl),
        }
    }

    pub fn entries(&self) -> &ResourceCache<Video> {
        &self.inner
    }

    pub fn key(course_id: &str) -> CacheKey {
        CacheKey::new(Resource::Videos, [course_id])
    }

    pub fn get(&self, course_id: &str) -> Option<Snapshot<Video>> {
        self.inner.get(&Self::key(course_id))
    }

    pub fn set(&self, course_id: &str, videos: Vec<Video>) {
        self.inner.set(&Self::key(course_id), videos);
    }
}
