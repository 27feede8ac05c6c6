//! Profile cache, scoped by caller and role.

use std::time::Duration;

use super::ResourceCache;
use crate::cache::{CacheKey, Resource, Role, Snapshot, TtlStore};
use crate::models::Profile;

#[derive(Debug, Clone)]
pub struct UserCache {
    inner: ResourceCache<Profile>,
}

impl UserCache {
    pub fn new(store: TtlStore, ttl: Duration) -> Self {
        Self {
            inner: ResourceCache::new(store, ttl),
        }
    }

    pub fn entries(&self) -> &ResourceCache<Profile> {
        &self.inner
    }

    pub fn key(scope_id: &str, is_admin: bool) -> CacheKey {
        CacheKey::new(
            Resource::Users,
            [scope_id, Role::from_admin_flag(is_admin).as_str()],
        )
    }

    pub fn get(&self, scope_id: &str, is_admin: bool) -> Option<Snapshot<Profile>> {
        self.inner.get(&Self::key(scope_id, is_admin))
    }

    pub fn set(&self, scope_id: &str, is_admin: bool, profiles: Vec<Profile>) {
        self.inner.set(&Self::key(scope_id, is_admin), profiles);
    }
}
