//! Domain records served by the cache.
//!
//! Each record type maps onto one backend collection and one cache facade.

mod course;
mod profile;
mod progress;
mod video;

pub use course::Course;
pub use profile::Profile;
pub use progress::Progress;
pub use video::Video;

use serde::de::DeserializeOwned;

use crate::cache::Resource;

/// Id prefix carried by every placeholder record.
pub const FALLBACK_ID_PREFIX: &str = "fallback-";

/// A record type that can be cached and decoded from backend rows.
pub trait Record: Clone + Send + Sync + DeserializeOwned + 'static {
    const RESOURCE: Resource;

    fn id(&self) -> &str;

    /// Whether this record is placeholder data.
    fn is_provisional(&self) -> bool {
        self.id().starts_with(FALLBACK_ID_PREFIX)
    }
}
