//! Chat and search history.
//!
//! The orchestrator records every exchange through [`HistoryStore`]. The
//! bundled [`InMemoryHistory`] keeps everything in process memory, which is
//! enough for a single-instance deployment and for tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{AirportCode, FlightOffer};

/// Chat messages returned per history request.
pub const CHAT_HISTORY_LIMIT: usize = 50;

/// Searches returned per history request.
pub const SEARCH_HISTORY_LIMIT: usize = 20;

/// Errors from a history backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HistoryError {
    /// The backend could not be reached or refused the write.
    #[error("history store unavailable: {0}")]
    Unavailable(String),
}

/// One message in a user's chat thread.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub message: String,
    pub is_user: bool,
    pub flights: Vec<FlightOffer>,
    pub timestamp: DateTime<Utc>,
}

/// A successful search, as recorded for the user's search history.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRecord {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    pub query: String,
    pub origin: AirportCode,
    pub destination: AirportCode,
    /// The date phrase as the user wrote it.
    pub date: String,
    pub results: Vec<FlightOffer>,
    pub timestamp: DateTime<Utc>,
}

/// A search to be recorded.
#[derive(Debug, Clone)]
pub struct NewSearch {
    pub user_id: Uuid,
    pub query: String,
    pub origin: AirportCode,
    pub destination: AirportCode,
    pub date: String,
    pub results: Vec<FlightOffer>,
}

/// Storage for chat and search history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append a message to a user's chat thread.
    async fn record_message(
        &self,
        user_id: Uuid,
        message: String,
        is_user: bool,
        flights: Vec<FlightOffer>,
    ) -> Result<ChatMessage, HistoryError>;

    /// Record a successful search.
    async fn record_search(&self, search: NewSearch) -> Result<SearchRecord, HistoryError>;

    /// The first `limit` messages of a user's thread, oldest first.
    async fn chat_history(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, HistoryError>;

    /// Delete a user's chat thread. Returns how many messages were removed.
    async fn clear_chat(&self, user_id: Uuid) -> Result<usize, HistoryError>;

    /// A user's `limit` most recent searches, newest first.
    async fn search_history(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<SearchRecord>, HistoryError>;
}

#[derive(Default)]
struct Tables {
    messages: HashMap<Uuid, Vec<ChatMessage>>,
    searches: HashMap<Uuid, Vec<SearchRecord>>,
}

/// Process-local history store.
#[derive(Clone, Default)]
pub struct InMemoryHistory {
    inner: Arc<RwLock<Tables>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    async fn record_message(
        &self,
        user_id: Uuid,
        message: String,
        is_user: bool,
        flights: Vec<FlightOffer>,
    ) -> Result<ChatMessage, HistoryError> {
        let entry = ChatMessage {
            id: Uuid::new_v4(),
            user_id,
            message,
            is_user,
            flights,
            timestamp: Utc::now(),
        };

        let mut guard = self.inner.write().await;
        guard
            .messages
            .entry(user_id)
            .or_default()
            .push(entry.clone());
        Ok(entry)
    }

    async fn record_search(&self, search: NewSearch) -> Result<SearchRecord, HistoryError> {
        let record = SearchRecord {
            id: Uuid::new_v4(),
            user_id: search.user_id,
            query: search.query,
            origin: search.origin,
            destination: search.destination,
            date: search.date,
            results: search.results,
            timestamp: Utc::now(),
        };

        let mut guard = self.inner.write().await;
        guard
            .searches
            .entry(record.user_id)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn chat_history(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, HistoryError> {
        let guard = self.inner.read().await;
        Ok(guard
            .messages
            .get(&user_id)
            .map(|thread| thread.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn clear_chat(&self, user_id: Uuid) -> Result<usize, HistoryError> {
        let mut guard = self.inner.write().await;
        Ok(guard
            .messages
            .remove(&user_id)
            .map(|thread| thread.len())
            .unwrap_or(0))
    }

    async fn search_history(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<SearchRecord>, HistoryError> {
        let guard = self.inner.read().await;
        Ok(guard
            .searches
            .get(&user_id)
            .map(|searches| searches.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
