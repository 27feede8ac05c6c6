//! Course list cache, scoped by caller and role.

use std::time::Duration;

use super::ResourceCache;
use crate::cache::{CacheKey, Resource, Role, Snapshot, TtlStore};
use crate::models::Course;

#[derive(Debug, Clone)]
pub struct CourseCache {
    inner: ResourceCache<Course>,
}

impl CourseCache {
    pub fn new(store: TtlStore, ttl: Duration) -> Self {
        Self {
            inner: ResourceCache::new(store, ttl),
        }
    }

    /// Key-level access to the same entries.
    pub fn entries(&self) -> &ResourceCache<Course> {
        &self.inner
    }

    pub fn key(scope_id: &str, is_admin: bool) -> CacheKey {
        CacheKey::new(
            Resource::Courses,
            [scope_id, Role::from_admin_flag(is_admin).as_str()],
        )
    }

    pub fn get(&self, scope_id: &str, is_admin: bool) -> Option<Snapshot<Course>> {
        self.inner.get(&Self::key(scope_id, is_admin))
    }

    pub fn set(&self, scope_id: &str, is_admin: bool, courses: Vec<Course>) {
        self.inner.set(&Self::key(scope_id, is_admin), courses);
    }
}
