//! Backend module - the remote data source behind the cache.
//!
//! The cache only assumes that a backend answers a [`Query`] with a list of
//! rows or an error, asynchronously, and that it may be slow or down.

mod memory;
mod mongo;
mod query;

pub use memory::{Reply, ScriptedBackend};
pub use mongo::MongoBackend;
pub use query::Query;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{BackendError, FetchError};
use crate::models::Record;

/// Remote data source.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch(&self, query: &Query) -> Result<Vec<Value>, BackendError>;
}

/// Decode backend rows into typed records.
pub fn decode<T: Record>(rows: Vec<Value>) -> Result<Vec<T>, FetchError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| FetchError::Decode {
                resource: T::RESOURCE.as_str(),
                message: e.to_string(),
            })
        })
        .collect()
}
