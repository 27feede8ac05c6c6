//! Cache lifetimes.

use std::time::Duration;

use thiserror::Error;

use super::Resource;

/// Rejected cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("{0} TTL must be greater than zero")]
    ZeroTtl(&'static str),

    #[error("fallback TTL ({fallback:?}) must be shorter than the {resource} TTL ({live:?})")]
    FallbackTooLong {
        resource: &'static str,
        fallback: Duration,
        live: Duration,
    },

    #[error("sweep interval must be greater than zero")]
    ZeroSweepInterval,
}

/// Lifetimes for every cached resource.
///
/// Catalog data changes rarely, so its entries live for hours. Progress
/// is mutated by learners all day and gets a shorter window. Placeholder
/// data from the fallback path lives only minutes so the live path is
/// attempted again soon.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub courses_ttl: Duration,
    pub videos_ttl: Duration,
    pub users_ttl: Duration,
    pub progress_ttl: Duration,

    /// Lifetime of fallback snapshots.
    pub fallback_ttl: Duration,

    /// How often the sweeper reclaims expired entries.
    pub sweep_interval: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            courses_ttl: Duration::from_secs(2 * 3600), // 2 hours
            videos_ttl: Duration::from_secs(2 * 3600),  // 2 hours
            users_ttl: Duration::from_secs(3600),       // 1 hour
            progress_ttl: Duration::from_secs(900),     // 15 minutes
            fallback_ttl: Duration::from_secs(120),     // 2 minutes
            sweep_interval: Duration::from_secs(1800),  // 30 minutes
        }
    }
}

impl CacheSettings {
    /// Default lifetime of a live entry for `resource`.
    pub fn ttl_for(&self, resource: Resource) -> Duration {
        match resource {
            Resource::Courses => self.courses_ttl,
            Resource::Videos => self.videos_ttl,
            Resource::Users => self.users_ttl,
            Resource::Progress => self.progress_ttl,
        }
    }

    #[must_use]
    pub fn courses_ttl(mut self, ttl: Duration) -> Self {
        self.courses_ttl = ttl;
        self
    }

    #[must_use]
    pub fn videos_ttl(mut self, ttl: Duration) -> Self {
        self.videos_ttl = ttl;
        self
    }

    #[must_use]
    pub fn users_ttl(mut self, ttl: Duration) -> Self {
        self.users_ttl = ttl;
        self
    }

    #[must_use]
    pub fn progress_ttl(mut self, ttl: Duration) -> Self {
        self.progress_ttl = ttl;
        self
    }

    #[must_use]
    pub fn fallback_ttl(mut self, ttl: Duration) -> Self {
        self.fallback_ttl = ttl;
        self
    }

    #[must_use]
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Check that every TTL is usable and fallback entries expire first.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.fallback_ttl.is_zero() {
            return Err(SettingsError::ZeroTtl("fallback"));
        }
        if self.sweep_interval.is_zero() {
            return Err(SettingsError::ZeroSweepInterval);
        }

        for resource in Resource::ALL {
            let live = self.ttl_for(resource);
            if live.is_zero() {
                return Err(SettingsError::ZeroTtl(resource.as_str()));
            }
            if self.fallback_ttl >= live {
                return Err(SettingsError::FallbackTooLong {
                    resource: resource.as_str(),
                    fallback: self.fallback_ttl,
                    live,
                });
            }
        }

        Ok(())
    }
}
