//! Course catalog entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;
use crate::cache::Resource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Unpublished courses are visible to administrators only.
    #[serde(default)]
    pub is_published: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Course {
    const RESOURCE: Resource = Resource::Courses;

    fn id(&self) -> &str {
        &self.id
    }
}
