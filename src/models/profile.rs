//! User profile.

use serde::{Deserialize, Serialize};

use super::Record;
use crate::cache::Resource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub full_name: String,

    /// Role name as stored by the backend (`admin`, `employee`, ...).
    #[serde(default = "default_role")]
    pub role: String,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_role() -> String {
    "employee".to_string()
}

fn default_active() -> bool {
    true
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

impl Record for Profile {
    const RESOURCE: Resource = Resource::Users;

    fn id(&self) -> &str {
        &self.id
    }
}
