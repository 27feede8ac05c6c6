//! Deterministic cache keys.

use std::borrow::Cow;
use std::fmt;

/// Resource families held in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Courses,
    Videos,
    Users,
    Progress,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Courses,
        Resource::Videos,
        Resource::Users,
        Resource::Progress,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Courses => "courses",
            Self::Videos => "videos",
            Self::Users => "users",
            Self::Progress => "progress",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role half of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn from_admin_flag(is_admin: bool) -> Self {
        if is_admin { Self::Admin } else { Self::Member }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

/// A rendered cache key: `resource:part:part...`.
///
/// Parts are escaped (`%` and `:`) so two different part lists can never
/// render to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

const SEPARATOR: char = ':';

impl CacheKey {
    pub fn new<'a>(resource: Resource, parts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut rendered = String::from(resource.as_str());
        for part in parts {
            rendered.push(SEPARATOR);
            rendered.push_str(&escape(part));
        }
        Self(rendered)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the rendered key `key` belongs to `scope_id` under `resource`,
    /// i.e. the first part after the resource name is exactly that scope.
    pub fn in_scope(key: &str, resource: Resource, scope_id: &str) -> bool {
        let Some(rest) = key
            .strip_prefix(resource.as_str())
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
        else {
            return false;
        };
        let scope = escape(scope_id);
        match rest.strip_prefix(&*scope) {
            Some(tail) => tail.is_empty() || tail.starts_with(SEPARATOR),
            None => false,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn escape(part: &str) -> Cow<'_, str> {
    if !part.contains(['%', SEPARATOR]) {
        return Cow::Borrowed(part);
    }
    let mut escaped = String::with_capacity(part.len() + 4);
    for c in part.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            SEPARATOR => escaped.push_str("%3A"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}
