use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kotoba_core::model::AppState;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::seed;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("seed data is invalid: {0}")]
    Seed(#[from] kotoba_core::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Blob store for the whole `AppState`.
///
/// Writes replace the stored snapshot wholesale; the last write wins.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Fetch the stored snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend or decoding fails.
    async fn fetch(&self) -> Result<Option<AppState>, StorageError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be written.
    async fn save(&self, state: &AppState) -> Result<(), StorageError>;

    /// Load the stored snapshot, seeding and saving the default corpus when empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn load(&self, now: DateTime<Utc>) -> Result<AppState, StorageError> {
        if let Some(state) = self.fetch().await? {
            return Ok(state);
        }
        tracing::info!("no stored state; seeding default decks");
        let state = seed::default_state(now)?;
        self.save(&state).await?;
        Ok(state)
    }

    /// Discard all progress and replace it with a freshly seeded snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn reset(&self, now: DateTime<Utc>) -> Result<AppState, StorageError> {
        let state = seed::default_state(now)?;
        self.save(&state).await?;
        tracing::info!(cards = state.card_count(), "state reset to seed corpus");
        Ok(state)
    }
}

/// Simple in-memory store for testing and prototyping.
///
/// Keeps the snapshot as serialized JSON so it goes through the same
/// encoding as the persistent backends.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    blob: Arc<Mutex<Option<String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `state`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the state cannot be encoded.
    pub fn with_state(state: &AppState) -> Result<Self, StorageError> {
        let store = Self::new();
        *store
            .blob
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))? =
            Some(serde_json::to_string(state)?);
        Ok(store)
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn fetch(&self) -> Result<Option<AppState>, StorageError> {
        let guard = self
            .blob
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .as_deref()
            .map(serde_json::from_str::<AppState>)
            .transpose()
            .map_err(Into::into)
    }

    async fn save(&self, state: &AppState) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(state)?;
        let mut guard = self
            .blob
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(encoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kotoba_core::model::{CardId, RecallState};
    use kotoba_core::time::fixed_now;

    #[tokio::test]
    async fn load_seeds_empty_store_once() {
        let store = InMemoryStore::new();
        assert!(store.fetch().await.unwrap().is_none());

        let first = store.load(fixed_now()).await.unwrap();
        assert!(first.card_count() > 0);
        assert_eq!(store.fetch().await.unwrap(), Some(first.clone()));

        let second = store.load(fixed_now()).await.unwrap();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn save_replaces_snapshot() {
        let store = InMemoryStore::new();
        let mut state = store.load(fixed_now()).await.unwrap();
        state.record_review(CardId::new(1), RecallState::new_at(fixed_now()), true);
        store.save(&state).await.unwrap();

        let fetched = store.fetch().await.unwrap().unwrap();
        assert_eq!(fetched.reviews_of(CardId::new(1)), 1);
    }

    #[tokio::test]
    async fn preloaded_state_is_not_reseeded() {
        let state = AppState::new();
        let store = InMemoryStore::with_state(&state).unwrap();
        let loaded = store.load(fixed_now()).await.unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.card_count(), 0);
    }

    #[tokio::test]
    async fn reset_discards_progress() {
        let store = InMemoryStore::new();
        let mut state = store.load(fixed_now()).await.unwrap();
        state.record_review(CardId::new(1), RecallState::new_at(fixed_now()), false);
        store.save(&state).await.unwrap();

        let fresh = store.reset(fixed_now()).await.unwrap();
        assert_eq!(fresh.reviews_of(CardId::new(1)), 0);
        assert_eq!(store.fetch().await.unwrap(), Some(fresh));
    }
}
