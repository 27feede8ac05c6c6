//! coursecache - read cache for a course catalog.
//!
//! UI collaborators ask for courses, videos, profiles and progress; the
//! cache answers from memory when it can, retries the backend briefly when
//! it cannot, and falls back to placeholder records when the backend is
//! down, so a read never fails outright.
//!
//! ## Architecture
//!
//! - `cache` - TTL store, key derivation, lifetimes
//! - `facades` - typed per-resource views over the store
//! - `fetcher` - cache-first remote reads with timeout and backoff
//! - `fallback` - placeholder record sets
//! - `loader` - batched, de-duplicated video loading
//! - `catalog` - the public read API tying it all together
//! - `backend` - the remote data source (MongoDB, scripted)
//! - `config` - environment configuration

pub mod backend;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod facades;
pub mod fallback;
pub mod fetcher;
pub mod loader;
pub mod models;

pub use backend::{Backend, MongoBackend, Query, Reply, ScriptedBackend};
pub use cache::{CacheKey, CacheSettings, Origin, Resource, Snapshot, TtlStore};
pub use catalog::{CatalogCache, CatalogOptions, CatalogStats, Lookup};
pub use error::{BackendError, FetchError};
pub use fetcher::{RetryPolicy, RetryingFetcher};
pub use loader::{LazyLoader, LoadState, LoaderSettings};
pub use models::{Course, Profile, Progress, Video};
