//! Logical queries the cache sends to the backend.

use crate::cache::Resource;

/// A read request against the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    /// Course list visible to `scope_id`; administrators also see drafts.
    Courses { scope_id: String, is_admin: bool },
    /// Videos of one course.
    Videos { course_id: String },
    /// Profiles visible to `scope_id`; administrators see everyone.
    Profiles { scope_id: String, is_admin: bool },
    /// Progress rows of one user over a set of courses.
    Progress {
        user_id: String,
        course_ids: Vec<String>,
    },
}

impl Query {
    pub fn courses(scope_id: impl Into<String>, is_admin: bool) -> Self {
        Self::Courses {
            scope_id: scope_id.into(),
            is_admin,
        }
    }

    pub fn videos(course_id: impl Into<String>) -> Self {
        Self::Videos {
            course_id: course_id.into(),
        }
    }

    pub fn profiles(scope_id: impl Into<String>, is_admin: bool) -> Self {
        Self::Profiles {
            scope_id: scope_id.into(),
            is_admin,
        }
    }

    /// Course ids are sorted and de-duplicated, so argument order never
    /// produces a different query.
    pub fn progress<S: AsRef<str>>(user_id: impl Into<String>, course_ids: &[S]) -> Self {
        let mut course_ids: Vec<String> = course_ids
            .iter()
            .map(|id| id.as_ref().to_string())
            .collect();
        course_ids.sort_unstable();
        course_ids.dedup();

        Self::Progress {
            user_id: user_id.into(),
            course_ids,
        }
    }

    pub fn resource(&self) -> Resource {
        match self {
            Self::Courses { .. } => Resource::Courses,
            Self::Videos { .. } => Resource::Videos,
            Self::Profiles { .. } => Resource::Users,
            Self::Progress { .. } => Resource::Progress,
        }
    }
}
