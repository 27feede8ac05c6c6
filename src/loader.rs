//! Lazy batch loader for per-course videos.
//!
//! After a course list renders, the videos of every course are pulled in
//! the background in small batches. Concurrent requests for the same course
//! share one in-flight load: the first caller spawns it and everyone else
//! awaits the same shared channel.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{Shared, join_all};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::backend::{Backend, Query};
use crate::cache::Snapshot;
use crate::error::FetchError;
use crate::facades::VideoCache;
use crate::fetcher::{RetryingFetcher, remote_read};
use crate::models::Video;

/// Load progress of one course's videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotStarted,
    Loading,
    Loaded,
}

#[derive(Debug, Clone)]
pub struct LoaderSettings {
    /// Courses fetched concurrently per batch.
    pub batch_size: usize,
    /// Pause between two batches.
    pub batch_pause: Duration,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_pause: Duration::from_millis(100),
        }
    }
}

type LoadResult = Result<Vec<Video>, FetchError>;
type InFlight = Shared<oneshot::Receiver<LoadResult>>;

#[derive(Default)]
struct LoaderState {
    in_flight: HashMap<String, InFlight>,
    loaded: HashSet<String>,
    /// Bumped by `reset`; a load started under an older generation must not
    /// write its result.
    generation: u64,
    /// Courses forgotten while their load was running.
    stale: HashSet<String>,
}

impl LoaderState {
    fn accepts(&self, course_id: &str, generation: u64) -> bool {
        self.generation == generation && !self.stale.contains(course_id)
    }
}

/// What a lookup found without starting anything.
enum Peek {
    Cached(Snapshot<Video>),
    Loading(InFlight),
    Missing,
}

/// Retires an in-flight entry when its load task ends, even by panic.
struct InFlightGuard {
    state: Arc<Mutex<LoaderState>>,
    course_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.in_flight.remove(&self.course_id);
        state.stale.remove(&self.course_id);
    }
}

/// Loads course videos into the [`VideoCache`], at most one load per course
/// at a time.
#[derive(Clone)]
pub struct LazyLoader {
    videos: VideoCache,
    fetcher: RetryingFetcher,
    backend: Arc<dyn Backend>,
    settings: LoaderSettings,
    state: Arc<Mutex<LoaderState>>,
}

impl LazyLoader {
    pub fn new(
        videos: VideoCache,
        fetcher: RetryingFetcher,
        backend: Arc<dyn Backend>,
        settings: LoaderSettings,
    ) -> Self {
        Self {
            videos,
            fetcher,
            backend,
            settings,
            state: Arc::default(),
        }
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    pub fn state(&self, course_id: &str) -> LoadState {
        let state = self.state.lock();
        if state.in_flight.contains_key(course_id) {
            LoadState::Loading
        } else if state.loaded.contains(course_id)
            && self.videos.entries().contains(&VideoCache::key(course_id))
        {
            LoadState::Loaded
        } else {
            LoadState::NotStarted
        }
    }

    /// Number of loads currently running.
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    /// Videos of one course.
    ///
    /// Served from the cache when present; joins a running load for the
    /// same course; otherwise starts one. A failed load yields an empty
    /// list and leaves the course `NotStarted` so the next call retries.
    pub async fn load_one(&self, course_id: &str) -> Vec<Video> {
        match self.fetch_one(course_id).await {
            Ok(snapshot) => snapshot.records,
            Err(err) => {
                warn!("Failed to load videos for course {}: {}", course_id, err);
                Vec::new()
            }
        }
    }

    /// Like [`load_one`](Self::load_one), but keeps the cached snapshot's
    /// origin and reports why a load failed.
    pub async fn fetch_one(&self, course_id: &str) -> Result<Snapshot<Video>, FetchError> {
        let channel = {
            let mut state = self.state.lock();
            match self.peek(&mut state, course_id) {
                Peek::Cached(snapshot) => return Ok(snapshot),
                Peek::Loading(channel) => {
                    debug!("Joining in-flight video load for course {}", course_id);
                    channel
                }
                Peek::Missing => {
                    let channel = self.spawn_load(course_id, state.generation);
                    state
                        .in_flight
                        .insert(course_id.to_string(), channel.clone());
                    channel
                }
            }
        };

        Self::wait(channel).await.map(Snapshot::live)
    }

    /// Videos for many courses, keyed by course id.
    ///
    /// Cached and in-flight courses cost no new request. The rest are
    /// fetched `batch_size` at a time; a batch starts only after the
    /// previous one settled, with a short pause in between. Every
    /// requested id appears in the result exactly once.
    pub async fn load_many<S: AsRef<str>>(
        &self,
        course_ids: &[S],
        batch_size: usize,
    ) -> HashMap<String, Vec<Video>> {
        let batch_size = batch_size.max(1);
        let mut results = HashMap::with_capacity(course_ids.len());
        let mut waiting = Vec::new();
        let mut missing = Vec::new();
        let mut seen = HashSet::new();

        {
            let mut state = self.state.lock();
            for course_id in course_ids {
                let course_id = course_id.as_ref();
                if !seen.insert(course_id) {
                    continue;
                }
                match self.peek(&mut state, course_id) {
                    Peek::Cached(snapshot) => {
                        results.insert(course_id.to_string(), snapshot.records);
                    }
                    Peek::Loading(channel) => waiting.push((course_id.to_string(), channel)),
                    Peek::Missing => missing.push(course_id.to_string()),
                }
            }
        }

        debug!(
            "Loading videos: {} cached, {} in flight, {} to fetch in batches of {}",
            results.len(),
            waiting.len(),
            missing.len(),
            batch_size
        );

        for (index, batch) in missing.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.settings.batch_pause).await;
            }
            let loaded = join_all(batch.iter().map(|course_id| async move {
                (course_id.clone(), self.load_one(course_id).await)
            }))
            .await;
            results.extend(loaded);
        }

        let joined = join_all(waiting.into_iter().map(|(course_id, channel)| async move {
            let videos = match Self::wait(channel).await {
                Ok(videos) => videos,
                Err(err) => {
                    warn!("Failed to load videos for course {}: {}", course_id, err);
                    Vec::new()
                }
            };
            (course_id, videos)
        }))
        .await;
        results.extend(joined);

        results
    }

    /// Forget that `course_id` was loaded. A load running right now still
    /// answers its callers but no longer writes to the cache.
    pub fn forget(&self, course_id: &str) {
        let mut state = self.state.lock();
        state.loaded.remove(course_id);
        if state.in_flight.contains_key(course_id) {
            state.stale.insert(course_id.to_string());
        }
    }

    /// Forget every loaded course. Running loads keep going but their
    /// results are no longer cached.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.loaded.clear();
        state.generation += 1;
    }

    fn peek(&self, state: &mut LoaderState, course_id: &str) -> Peek {
        if let Some(channel) = state.in_flight.get(course_id) {
            return Peek::Loading(channel.clone());
        }
        match self.videos.get(course_id) {
            Some(snapshot) => {
                state.loaded.insert(course_id.to_string());
                Peek::Cached(snapshot)
            }
            None => {
                state.loaded.remove(course_id);
                Peek::Missing
            }
        }
    }

    /// Spawn the load task for `course_id`. The caller must register the
    /// returned channel under the state lock it already holds.
    fn spawn_load(&self, course_id: &str, generation: u64) -> InFlight {
        let (sender, receiver) = oneshot::channel();

        let guard = InFlightGuard {
            state: Arc::clone(&self.state),
            course_id: course_id.to_string(),
        };
        let fetcher = self.fetcher.clone();
        let backend = Arc::clone(&self.backend);
        let videos = self.videos.clone();

        tokio::spawn(async move {
            let query = Query::videos(guard.course_id.as_str());

            // The cache was checked under the state lock, so go straight to
            // the backend and write the result only if nobody invalidated it.
            let result = fetcher
                .fetch(remote_read::<Video>(&backend, &query), None)
                .await
                .map(|snapshot| snapshot.records);

            if let Ok(records) = &result {
                let mut state = guard.state.lock();
                if state.accepts(&guard.course_id, generation) {
                    videos.set(&guard.course_id, records.clone());
                    state.loaded.insert(guard.course_id.clone());
                } else {
                    debug!(
                        "Discarding videos for course {}: invalidated while loading",
                        guard.course_id
                    );
                }
            }

            // Retire the entry before answering: a caller either joins this
            // channel or finds the cache already written.
            drop(guard);
            sender.send(result).ok();
        });

        receiver.shared()
    }

    async fn wait(channel: InFlight) -> LoadResult {
        channel.await.unwrap_or_else(|_| {
            Err(FetchError::Interrupted {
                resource: "videos",
            })
        })
    }
}

impl std::fmt::Debug for LazyLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LazyLoader")
            .field("in_flight", &state.in_flight.len())
            .field("loaded", &state.loaded.len())
            .finish()
    }
}
