//! Lesson video belonging to a course.

use serde::{Deserialize, Serialize};

use super::Record;
use crate::cache::Resource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub course_id: String,
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Length in seconds.
    #[serde(default)]
    pub duration_secs: u32,

    /// Position of the lesson within its course.
    #[serde(default)]
    pub order_index: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl Record for Video {
    const RESOURCE: Resource = Resource::Videos;

    fn id(&self) -> &str {
        &self.id
    }
}
