use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{SnapshotRepository, StorageError};
use upskill_core::model::Snapshot;

use super::{SNAPSHOT_KEY, SqliteRepository};

#[async_trait]
impl SnapshotRepository for SqliteRepository {
    async fn load(&self) -> Result<Option<Snapshot>, StorageError> {
        let row = sqlx::query("SELECT value FROM snapshots WHERE key = ?1")
            .bind(SNAPSHOT_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: String = row
            .try_get("value")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        // A malformed snapshot is discarded, not surfaced: the caller
        // reinitializes to the empty default state.
        Ok(serde_json::from_str(&value).ok())
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let value = serde_json::to_string(snapshot)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO snapshots (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(SNAPSHOT_KEY)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM snapshots WHERE key = ?1")
            .bind(SNAPSHOT_KEY)
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
