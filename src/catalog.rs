//! Catalog cache - the read API UI collaborators call instead of the backend.
//!
//! Every read goes cache → retrying fetcher → fallback. Callers always get
//! data back: live, cached or placeholder, tagged with its [`Origin`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::{Backend, Query};
use crate::cache::{
    CacheKey, CacheSettings, Origin, SettingsError, Snapshot, StoreStats, TtlStore,
};
use crate::error::FetchError;
use crate::facades::{CourseCache, ProgressCache, ResourceCache, UserCache, VideoCache};
use crate::fallback::{Fallback, fallback_for};
use crate::fetcher::{CacheSlot, RetryPolicy, RetryingFetcher, remote_read};
use crate::loader::{LazyLoader, LoaderSettings};
use crate::models::{Course, Profile, Progress, Video};

/// Result of a catalog read.
#[derive(Debug, Clone)]
pub struct Lookup<T> {
    pub data: Vec<T>,
    pub origin: Origin,
    /// Why the live path failed, when `data` is fallback data produced by
    /// this call.
    pub error: Option<FetchError>,
}

impl<T> Lookup<T> {
    pub fn is_fallback(&self) -> bool {
        self.origin == Origin::Fallback
    }
}

impl<T> From<Snapshot<T>> for Lookup<T> {
    fn from(snapshot: Snapshot<T>) -> Self {
        Self {
            data: snapshot.records,
            origin: snapshot.origin,
            error: None,
        }
    }
}

/// Store counters plus running loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub active: usize,
    pub expired: usize,
    pub total: usize,
    pub in_flight: usize,
}

impl From<StoreStats> for CatalogStats {
    fn from(stats: StoreStats) -> Self {
        Self {
            active: stats.active,
            expired: stats.expired,
            total: stats.total,
            in_flight: 0,
        }
    }
}

/// Everything needed to build a [`CatalogCache`].
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    pub cache: CacheSettings,
    pub retry: RetryPolicy,
    pub loader: LoaderSettings,
}

/// One cache instance: shared store, facades, fetcher, loader and sweeper.
///
/// Build one per process in production; tests build as many isolated
/// instances as they like.
pub struct CatalogCache {
    store: TtlStore,
    settings: CacheSettings,
    backend: Arc<dyn Backend>,
    fetcher: RetryingFetcher,
    courses: CourseCache,
    videos: VideoCache,
    users: UserCache,
    progress: ProgressCache,
    loader: LazyLoader,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl CatalogCache {
    /// Build an isolated instance.
    ///
    /// # Errors
    /// Rejects settings that fail [`CacheSettings::validate`], such as a
    /// fallback TTL that would outlive live data.
    pub fn new(backend: Arc<dyn Backend>, options: CatalogOptions) -> Result<Self, SettingsError> {
        let CatalogOptions {
            cache: settings,
            retry,
            loader,
        } = options;

        settings.validate()?;

        let store = TtlStore::new();
        let fetcher = RetryingFetcher::new(store.clone(), retry);
        let videos = VideoCache::new(store.clone(), settings.videos_ttl);
        let loader = LazyLoader::new(
            videos.clone(),
            fetcher.clone(),
            Arc::clone(&backend),
            loader,
        );

        info!("Catalog cache initialized");

        Ok(Self {
            courses: CourseCache::new(store.clone(), settings.courses_ttl),
            users: UserCache::new(store.clone(), settings.users_ttl),
            progress: ProgressCache::new(store.clone(), settings.progress_ttl),
            videos,
            loader,
            fetcher,
            backend,
            settings,
            store,
            sweeper: Mutex::new(None),
        })
    }

    /// Courses visible to `scope_id`.
    pub async fn get_courses(&self, scope_id: &str, is_admin: bool) -> Lookup<Course> {
        let key = CourseCache::key(scope_id, is_admin);
        self.read_through(
            self.courses.entries(),
            &key,
            Query::courses(scope_id, is_admin),
        )
        .await
    }

    /// Videos of one course.
    ///
    /// Misses go through the loader, so this shares any load already
    /// running for the same course.
    pub async fn get_videos(&self, course_id: &str) -> Lookup<Video> {
        match self.loader.fetch_one(course_id).await {
            Ok(snapshot) => snapshot.into(),
            Err(err) => self.fall_back(
                self.videos.entries(),
                &VideoCache::key(course_id),
                &Query::videos(course_id),
                err,
            ),
        }
    }

    /// Progress of `user_id` over `course_ids`.
    pub async fn get_user_progress<S: AsRef<str>>(
        &self,
        user_id: &str,
        course_ids: &[S],
    ) -> Lookup<Progress> {
        let key = ProgressCache::key(user_id, course_ids);
        self.read_through(
            self.progress.entries(),
            &key,
            Query::progress(user_id, course_ids),
        )
        .await
    }

    /// Profiles visible to `scope_id`.
    pub async fn get_profiles(&self, scope_id: &str, is_admin: bool) -> Lookup<Profile> {
        let key = UserCache::key(scope_id, is_admin);
        self.read_through(
            self.users.entries(),
            &key,
            Query::profiles(scope_id, is_admin),
        )
        .await
    }

    /// Videos for many courses at once, see [`LazyLoader::load_many`].
    pub async fn load_multiple_courses<S: AsRef<str>>(
        &self,
        course_ids: &[S],
        batch_size: usize,
    ) -> HashMap<String, Vec<Video>> {
        self.loader.load_many(course_ids, batch_size).await
    }

    /// Cache first, then the retrying fetcher; on exhaustion, fallback
    /// records cached under the same key for the short fallback TTL.
    async fn read_through<T: Fallback>(
        &self,
        cache: &ResourceCache<T>,
        key: &CacheKey,
        query: Query,
    ) -> Lookup<T> {
        let result = self
            .fetcher
            .fetch(
                remote_read::<T>(&self.backend, &query),
                Some(CacheSlot::new(key, cache.ttl())),
            )
            .await;

        match result {
            Ok(snapshot) => snapshot.into(),
            Err(err) => self.fall_back(cache, key, &query, err),
        }
    }

    fn fall_back<T: Fallback>(
        &self,
        cache: &ResourceCache<T>,
        key: &CacheKey,
        query: &Query,
        err: FetchError,
    ) -> Lookup<T> {
        warn!("Serving fallback {} for {}: {}", cache.resource(), key, err);
        let records = fallback_for::<T>(query);
        cache.set_fallback(key, records.clone(), self.settings.fallback_ttl);
        Lookup {
            data: records,
            origin: Origin::Fallback,
            error: Some(err),
        }
    }

    /// Drop every entry scoped to `scope_id` (a user id or course id) across
    /// all resources.
    pub fn invalidate(&self, scope_id: &str) -> usize {
        // Loader first: a load finishing in between must not write back.
        self.loader.forget(scope_id);
        let removed = self.courses.entries().invalidate_scope(scope_id)
            + self.videos.entries().invalidate_scope(scope_id)
            + self.users.entries().invalidate_scope(scope_id)
            + self.progress.entries().invalidate_scope(scope_id);
        debug!("Invalidated {} entries for scope {}", removed, scope_id);
        removed
    }

    pub fn clear_all(&self) {
        self.loader.reset();
        self.store.clear();
        info!("Catalog cache cleared");
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            in_flight: self.loader.in_flight(),
            ..CatalogStats::from(self.store.stats())
        }
    }

    /// Start the periodic sweep. Does nothing if one is already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_sweeper(&self) {
        let mut sweeper = self.sweeper.lock();
        if sweeper.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let store = self.store.clone();
        let interval = self.settings.sweep_interval;
        *sweeper = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = store.cleanup();
                let stats = store.stats();
                info!(
                    "Cache sweep: removed {}, {} active of {} total",
                    removed, stats.active, stats.total
                );
            }
        }));
        info!("Cache sweeper started (every {:?})", interval);
    }

    /// Stop the sweeper and drop all cached state.
    pub fn dispose(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
        self.clear_all();
        info!("Catalog cache disposed");
    }

    pub fn store(&self) -> &TtlStore {
        &self.store
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn courses(&self) -> &CourseCache {
        &self.courses
    }

    pub fn videos(&self) -> &VideoCache {
        &self.videos
    }

    pub fn users(&self) -> &UserCache {
        &self.users
    }

    pub fn progress(&self) -> &ProgressCache {
        &self.progress
    }

    pub fn loader(&self) -> &LazyLoader {
        &self.loader
    }
}

impl Drop for CatalogCache {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("store", &self.store)
            .field("loader", &self.loader)
            .finish()
    }
}
