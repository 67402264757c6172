use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use upskill_core::model::Snapshot;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable key-value facility for the tracker snapshot.
///
/// The whole tracker state is persisted wholesale under one fixed key and
/// restored at startup. Persistence is advisory for the next cold start:
/// the in-memory tracker stays the source of truth for a running session,
/// and concurrent instances overwrite each other last-writer-wins.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Load the persisted snapshot, if any.
    ///
    /// A stored value that fails to deserialize is treated as absent, not
    /// as an error; callers fall back to the empty default state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for transport failures.
    async fn load(&self) -> Result<Option<Snapshot>, StorageError>;

    /// Persist the snapshot, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError>;

    /// Remove the persisted snapshot entirely (full store reset).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Simple in-memory snapshot holder for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemorySnapshots {
    slot: Arc<Mutex<Option<Snapshot>>>,
}

impl InMemorySnapshots {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotRepository for InMemorySnapshots {
    async fn load(&self) -> Result<Option<Snapshot>, StorageError> {
        let guard = self
            .slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let mut guard = self
            .slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(snapshot.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self
            .slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Aggregates snapshot storage behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub snapshots: Arc<dyn SnapshotRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            snapshots: Arc::new(InMemorySnapshots::new()),
        }
    }
}
