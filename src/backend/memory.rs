//! In-process backend driven by programmed replies.
//!
//! Used by tests and local runs without a database. Every call is counted
//! per query so callers can assert how often the remote path was taken.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;

use super::{Backend, Query};
use crate::error::BackendError;

/// What the backend does when a query arrives.
#[derive(Debug, Clone)]
pub enum Reply {
    Rows(Vec<Value>),
    Error(BackendError),
    /// Never answers.
    Hang,
    /// Wait, then play the inner reply.
    Delayed(Duration, Box<Reply>),
}

impl Reply {
    pub fn delayed(delay: Duration, reply: Reply) -> Self {
        Self::Delayed(delay, Box::new(reply))
    }
}

/// Backend answering from a script.
///
/// One-shot replies queued with [`push`](Self::push) are played first, in
/// order; after that the standing reply set by [`reply`](Self::reply) is
/// used. Unscripted queries return no rows.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    queued: Mutex<HashMap<Query, VecDeque<Reply>>>,
    standing: Mutex<HashMap<Query, Reply>>,
    calls: DashMap<Query, usize>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with `rows` from now on.
    pub fn respond(&self, query: Query, rows: Vec<Value>) {
        self.reply(query, Reply::Rows(rows));
    }

    /// Set the standing reply for `query`.
    pub fn reply(&self, query: Query, reply: Reply) {
        self.standing.lock().insert(query, reply);
    }

    /// Queue a reply played by the next unanswered call for `query`.
    pub fn push(&self, query: Query, reply: Reply) {
        self.queued.lock().entry(query).or_default().push_back(reply);
    }

    /// How many times `query` reached the backend.
    pub fn calls(&self, query: &Query) -> usize {
        self.calls.get(query).map(|count| *count).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|count| *count.value()).sum()
    }

    fn next_reply(&self, query: &Query) -> Reply {
        if let Some(reply) = self
            .queued
            .lock()
            .get_mut(query)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        self.standing
            .lock()
            .get(query)
            .cloned()
            .unwrap_or(Reply::Rows(Vec::new()))
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn fetch(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        *self.calls.entry(query.clone()).or_insert(0) += 1;

        let mut reply = self.next_reply(query);
        loop {
            match reply {
                Reply::Rows(rows) => return Ok(rows),
                Reply::Error(err) => return Err(err),
                Reply::Hang => return futures::future::pending().await,
                Reply::Delayed(delay, next) => {
                    tokio::time::sleep(delay).await;
                    reply = *next;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_queued_replies_play_before_standing() {
        let backend = ScriptedBackend::new();
        let query = Query::videos("c1");
        backend.respond(query.clone(), vec![json!({ "id": "v1" })]);
        backend.push(
            query.clone(),
            Reply::Error(BackendError::new("503", "unavailable")),
        );

        assert!(backend.fetch(&query).await.is_err());
        assert_eq!(backend.fetch(&query).await.unwrap().len(), 1);
        assert_eq!(backend.calls(&query), 2);
    }

    #[tokio::test]
    async fn test_unscripted_query_is_empty() {
        let backend = ScriptedBackend::new();
        let rows = backend.fetch(&Query::courses("u1", false)).await.unwrap();

        assert!(rows.is_empty());
        assert_eq!(backend.total_calls(), 1);
    }
}
