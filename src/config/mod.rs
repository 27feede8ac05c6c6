//! Configuration module for the catalog cache.
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::cache::CacheSettings;
use crate::catalog::CatalogOptions;
use crate::fetcher::RetryPolicy;
use crate::loader::LoaderSettings;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    /// Scope id used to warm the admin course list at startup.
    pub warm_admin_scope: Option<String>,

    pub cache: CacheSettings,
    pub retry: RetryPolicy,
    pub loader: LoaderSettings,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Fails if `MONGODB_URI` is missing or a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mongodb_uri = env::var("MONGODB_URI").context("MONGODB_URI must be set")?;
        let mongodb_database = env::var("MONGODB_DATABASE").unwrap_or_else(|_| "lms".to_string());

        let warm_admin_scope = env::var("WARM_ADMIN_SCOPE")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let defaults = CacheSettings::default();
        let cache = CacheSettings {
            courses_ttl: secs("CACHE_COURSES_TTL_SECS", defaults.courses_ttl)?,
            videos_ttl: secs("CACHE_VIDEOS_TTL_SECS", defaults.videos_ttl)?,
            users_ttl: secs("CACHE_USERS_TTL_SECS", defaults.users_ttl)?,
            progress_ttl: secs("CACHE_PROGRESS_TTL_SECS", defaults.progress_ttl)?,
            fallback_ttl: secs("CACHE_FALLBACK_TTL_SECS", defaults.fallback_ttl)?,
            sweep_interval: secs("CACHE_SWEEP_INTERVAL_SECS", defaults.sweep_interval)?,
        };
        cache.validate().context("invalid cache settings")?;

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse("RETRY_MAX_ATTEMPTS", defaults.max_attempts)?,
            base_delay: millis("RETRY_BASE_DELAY_MS", defaults.base_delay)?,
            max_delay: millis("RETRY_MAX_DELAY_MS", defaults.max_delay)?,
            attempt_timeout: millis("RETRY_ATTEMPT_TIMEOUT_MS", defaults.attempt_timeout)?,
        };
        if retry.max_attempts == 0 {
            bail!("RETRY_MAX_ATTEMPTS must be at least 1");
        }

        let defaults = LoaderSettings::default();
        let loader = LoaderSettings {
            batch_size: parse("LOADER_BATCH_SIZE", defaults.batch_size)?,
            batch_pause: millis("LOADER_BATCH_PAUSE_MS", defaults.batch_pause)?,
        };

        Ok(Self {
            mongodb_uri,
            mongodb_database,
            warm_admin_scope,
            cache,
            retry,
            loader,
        })
    }

    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            cache: self.cache.clone(),
            retry: self.retry.clone(),
            loader: self.loader.clone(),
        }
    }
}

/// Parse `name` if set, else return `default`.
fn parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn secs(name: &str, default: Duration) -> Result<Duration> {
    parse(name, default.as_secs()).map(Duration::from_secs)
}

fn millis(name: &str, default: Duration) -> Result<Duration> {
    parse(name, default.as_millis() as u64).map(Duration::from_millis)
}
