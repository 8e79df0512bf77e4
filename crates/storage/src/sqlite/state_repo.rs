use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kotoba_core::model::AppState;
use sqlx::Row;

use crate::repository::{StateStore, StorageError};

use super::SqliteStore;

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl SqliteStore {
    /// When the snapshot was last written, if ever.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    pub async fn saved_at(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let row = sqlx::query("SELECT saved_at FROM app_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.map(|r| r.try_get::<DateTime<Utc>, _>("saved_at"))
            .transpose()
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn fetch(&self) -> Result<Option<AppState>, StorageError> {
        let row = sqlx::query("SELECT payload FROM app_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row
            .try_get("payload")
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let state = serde_json::from_str::<AppState>(&payload)?;
        Ok(Some(state))
    }

    async fn save(&self, state: &AppState) -> Result<(), StorageError> {
        let payload = serde_json::to_string(state)?;
        sqlx::query(
            r"
            INSERT INTO app_state (id, payload, saved_at)
            VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET
                payload = excluded.payload,
                saved_at = excluded.saved_at
            ",
        )
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        tracing::debug!(cards = state.card_count(), "state snapshot saved");
        Ok(())
    }
}
