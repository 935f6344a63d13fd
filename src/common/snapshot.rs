use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_id: Uuid,
    pub agent_id: String,
    pub agent_kind: String,
    pub agent_version: u64,
    pub snapshot_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new<T: Serialize>(
        agent_id: &str,
        agent_kind: &str,
        agent_version: u64,
        agent_data: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            snapshot_id: Uuid::new_v4(),
            agent_id: agent_id.to_string(),
            agent_kind: agent_kind.to_string(),
            agent_version,
            snapshot_data: serde_json::to_value(agent_data)?,
            created_at: Utc::now(),
        })
    }
}

/// All snapshots taken at one sync instant. Stores persist a batch as a
/// unit: either every snapshot lands or none does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotBatch {
    pub batch_id: Uuid,
    pub sim_time_ms: u64,
    pub created_at: DateTime<Utc>,
    pub snapshots: Vec<Snapshot>,
}

impl SnapshotBatch {
    pub fn new(sim_time_ms: u64, snapshots: Vec<Snapshot>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            sim_time_ms,
            created_at: Utc::now(),
            snapshots,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save_batch(&self, batch: SnapshotBatch) -> Result<(), String>;

    async fn latest_batch(&self) -> Result<Option<SnapshotBatch>, String>;
}
