//! Provenance-tagged payloads.

/// Where a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Fetched from the backend.
    Live,
    /// Placeholder data substituted after the live path gave up.
    Fallback,
}

/// The value facades keep in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub origin: Origin,
    pub records: Vec<T>,
}

impl<T> Snapshot<T> {
    pub fn live(records: Vec<T>) -> Self {
        Self {
            origin: Origin::Live,
            records,
        }
    }

    pub fn fallback(records: Vec<T>) -> Self {
        Self {
            origin: Origin::Fallback,
            records,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == Origin::Fallback
    }
}
