//! Degraded-mode fallback records.
//!
//! Placeholder data served when the backend cannot be reached. Records have
//! the same shape as live ones, and every id starts with
//! [`FALLBACK_ID_PREFIX`](crate::models::FALLBACK_ID_PREFIX).

use once_cell::sync::Lazy;

use crate::backend::Query;
use crate::models::{Course, Profile, Progress, Record, Video};

/// Record types with a static placeholder set.
pub trait Fallback: Record {
    /// Placeholder records answering `query`. Never fails, never does I/O.
    fn fallback(query: &Query) -> Vec<Self>;
}

/// Placeholder set for `T`.
pub fn fallback_for<T: Fallback>(query: &Query) -> Vec<T> {
    T::fallback(query)
}

static COURSES: Lazy<Vec<Course>> = Lazy::new(|| {
    vec![
        Course {
            id: "fallback-course-1".to_string(),
            title: "Introduction to the Platform".to_string(),
            description: "Course list is temporarily unavailable. Showing a cached overview."
                .to_string(),
            is_published: true,
            thumbnail_url: None,
            created_at: None,
        },
        Course {
            id: "fallback-course-2".to_string(),
            title: "Workplace Safety Basics".to_string(),
            description: "Course details will appear once the connection is restored."
                .to_string(),
            is_published: true,
            thumbnail_url: None,
            created_at: None,
        },
    ]
});

impl Fallback for Course {
    fn fallback(_query: &Query) -> Vec<Self> {
        COURSES.clone()
    }
}

impl Fallback for Video {
    fn fallback(query: &Query) -> Vec<Self> {
        let course_id = match query {
            Query::Videos { course_id } => course_id.as_str(),
            _ => "fallback-course-1",
        };

        vec![Video {
            id: format!("fallback-video-{course_id}"),
            course_id: course_id.to_string(),
            title: "Lesson temporarily unavailable".to_string(),
            description: "Lessons will load again shortly.".to_string(),
            duration_secs: 0,
            order_index: 0,
            video_url: None,
        }]
    }
}

impl Fallback for Profile {
    fn fallback(query: &Query) -> Vec<Self> {
        let (id, role) = match query {
            Query::Profiles {
                scope_id,
                is_admin: true,
            } => (scope_id.as_str(), "admin"),
            Query::Profiles { scope_id, .. } => (scope_id.as_str(), "employee"),
            _ => ("user", "employee"),
        };

        vec![Profile {
            id: format!("fallback-profile-{id}"),
            email: String::new(),
            full_name: "Profile unavailable".to_string(),
            role: role.to_string(),
            is_active: true,
        }]
    }
}

impl Fallback for Progress {
    /// One zeroed row per requested course, so progress bars still render.
    fn fallback(query: &Query) -> Vec<Self> {
        let Query::Progress {
            user_id,
            course_ids,
        } = query
        else {
            return Vec::new();
        };

        course_ids
            .iter()
            .map(|course_id| Progress {
                id: format!("fallback-progress-{user_id}-{course_id}"),
                user_id: user_id.clone(),
                course_id: course_id.clone(),
                video_id: None,
                completed: false,
                progress_percent: 0,
                updated_at: None,
            })
            .collect()
    }
}
