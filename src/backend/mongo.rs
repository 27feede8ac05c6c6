//! MongoDB-backed data source.

use async_trait::async_trait;
use futures::StreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::{Client, Collection, options::ClientOptions, options::FindOptions};
use serde_json::Value;
use tracing::{debug, info};

use super::{Backend, Query};
use crate::error::BackendError;

/// Backend reading the catalog collections of one MongoDB database.
#[derive(Debug, Clone)]
pub struct MongoBackend {
    client: Client,
    db: mongodb::Database,
}

impl MongoBackend {
    /// Connect to MongoDB with the given URI and database name.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect(uri: &str, db_name: &str) -> anyhow::Result<Self> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;

        // Ping the database to verify connection
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        info!("Successfully connected to MongoDB");

        let db = client.database(db_name);

        Ok(Self { client, db })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        sort: Document,
    ) -> Result<Vec<Value>, BackendError> {
        let options = FindOptions::builder().sort(sort).build();

        let mut cursor = self
            .collection(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(database_error)?;

        let mut rows = Vec::new();
        while let Some(result) = cursor.next().await {
            let document = result.map_err(database_error)?;
            rows.push(document_to_json(document));
        }

        debug!("Fetched {} rows from {}", rows.len(), collection);
        Ok(rows)
    }
}

#[async_trait]
impl Backend for MongoBackend {
    async fn fetch(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        match query {
            Query::Courses { is_admin, .. } => {
                let filter = if *is_admin {
                    doc! {}
                } else {
                    doc! { "is_published": true }
                };
                self.find("courses", filter, doc! { "title": 1 }).await
            }
            Query::Videos { course_id } => {
                self.find(
                    "videos",
                    doc! { "course_id": course_id.as_str() },
                    doc! { "order_index": 1 },
                )
                .await
            }
            Query::Profiles { scope_id, is_admin } => {
                let filter = if *is_admin {
                    doc! {}
                } else {
                    doc! { "id": scope_id.as_str() }
                };
                self.find("profiles", filter, doc! { "full_name": 1 }).await
            }
            Query::Progress {
                user_id,
                course_ids,
            } => {
                let filter = doc! {
                    "user_id": user_id.as_str(),
                    "course_id": { "$in": course_ids.clone() },
                };
                self.find("progress", filter, doc! { "course_id": 1 }).await
            }
        }
    }
}

fn database_error(err: mongodb::error::Error) -> BackendError {
    BackendError::new("database", err.to_string())
}

/// Convert a document into the JSON shape the models decode.
///
/// Dates become RFC 3339 strings and object ids become hex strings; a
/// missing `id` is filled from `_id`.
fn document_to_json(mut document: Document) -> Value {
    if !document.contains_key("id") {
        if let Some(object_id) = document.get("_id").cloned() {
            document.insert("id", object_id);
        }
    }
    document.remove("_id");
    bson_to_json(Bson::Document(document))
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(text) => Value::String(text),
            Err(_) => Bson::DateTime(dt).into_relaxed_extjson(),
        },
        Bson::Document(document) => Value::Object(
            document
                .into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect(),
        ),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}
