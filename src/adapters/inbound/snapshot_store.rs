use crate::common::{SnapshotBatch, SnapshotStore};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Keeps every batch in memory, oldest first. Used in tests and when no
/// store is configured.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    batches: RwLock<Vec<SnapshotBatch>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn batch_count(&self) -> usize {
        self.batches.read().await.len()
    }

    pub async fn batches(&self) -> Vec<SnapshotBatch> {
        self.batches.read().await.clone()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save_batch(&self, batch: SnapshotBatch) -> Result<(), String> {
        self.batches.write().await.push(batch);
        Ok(())
    }

    async fn latest_batch(&self) -> Result<Option<SnapshotBatch>, String> {
        Ok(self.batches.read().await.last().cloned())
    }
}
