//! Per-user course progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;
use crate::cache::Resource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub id: String,
    pub user_id: String,
    pub course_id: String,

    /// Last video the user watched, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,

    #[serde(default)]
    pub completed: bool,

    /// 0..=100
    #[serde(default)]
    pub progress_percent: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Progress {
    const RESOURCE: Resource = Resource::Progress;

    fn id(&self) -> &str {
        &self.id
    }
}
