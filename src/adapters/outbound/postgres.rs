use crate::common::{Snapshot, SnapshotBatch, SnapshotStore};
use crate::config::PostgresConfig;
use async_trait::async_trait;
use deadpool_postgres::{Config, Pool, PoolConfig, Runtime};
use tokio_postgres::NoTls;
use uuid::Uuid;

/// Snapshot batches in PostgreSQL. A batch row and its snapshot rows are
/// written in one transaction.
pub struct PostgresSnapshotStore {
    pool: Pool,
}

impl PostgresSnapshotStore {
    pub async fn new(config: PostgresConfig) -> Result<Self, String> {
        let mut pg_config = Config::new();
        pg_config.host = Some(config.host);
        pg_config.port = Some(config.port);
        pg_config.dbname = Some(config.database);
        pg_config.user = Some(config.username);
        pg_config.password = Some(config.password);
        pg_config.pool = Some(PoolConfig::new(config.max_connections as usize));

        let pool = pg_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| format!("Failed to create PostgreSQL pool: {}", e))?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<(), String> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| format!("Failed to get database connection: {}", e))?;

        let schema = r#"
            CREATE TABLE IF NOT EXISTS snapshot_batches (
                batch_id UUID PRIMARY KEY,
                sim_time_ms BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );

            CREATE TABLE IF NOT EXISTS agent_snapshots (
                snapshot_id UUID PRIMARY KEY,
                batch_id UUID NOT NULL REFERENCES snapshot_batches(batch_id) ON DELETE CASCADE,
                agent_id VARCHAR(255) NOT NULL,
                agent_kind VARCHAR(32) NOT NULL,
                agent_version BIGINT NOT NULL,
                snapshot_data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );

            CREATE INDEX IF NOT EXISTS idx_agent_snapshots_batch
            ON agent_snapshots(batch_id);

            CREATE INDEX IF NOT EXISTS idx_snapshot_batches_time
            ON snapshot_batches(sim_time_ms DESC);
        "#;

        client
            .batch_execute(schema)
            .await
            .map_err(|e| format!("Failed to initialize database schema: {}", e))?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for PostgresSnapshotStore {
    async fn save_batch(&self, batch: SnapshotBatch) -> Result<(), String> {
        let mut client = self
            .pool
            .get()
            .await
            .map_err(|e| format!("Failed to get database connection: {}", e))?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| format!("Failed to open transaction: {}", e))?;

        tx.execute(
            "INSERT INTO snapshot_batches (batch_id, sim_time_ms, created_at) VALUES ($1, $2, $3)",
            &[&batch.batch_id, &(batch.sim_time_ms as i64), &batch.created_at],
        )
        .await
        .map_err(|e| format!("Failed to save snapshot batch: {}", e))?;

        let stmt = tx
            .prepare(
                "INSERT INTO agent_snapshots
                 (snapshot_id, batch_id, agent_id, agent_kind, agent_version, snapshot_data, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .await
            .map_err(|e| format!("Failed to prepare statement: {}", e))?;

        for snapshot in &batch.snapshots {
            tx.execute(
                &stmt,
                &[
                    &snapshot.snapshot_id,
                    &batch.batch_id,
                    &snapshot.agent_id,
                    &snapshot.agent_kind,
                    &(snapshot.agent_version as i64),
                    &snapshot.snapshot_data,
                    &snapshot.created_at,
                ],
            )
            .await
            .map_err(|e| format!("Failed to save snapshot of {}: {}", snapshot.agent_id, e))?;
        }

        tx.commit()
            .await
            .map_err(|e| format!("Failed to commit snapshot batch: {}", e))
    }

    async fn latest_batch(&self) -> Result<Option<SnapshotBatch>, String> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| format!("Failed to get database connection: {}", e))?;

        let Some(row) = client
            .query_opt(
                "SELECT batch_id, sim_time_ms, created_at FROM snapshot_batches
                 ORDER BY sim_time_ms DESC, created_at DESC LIMIT 1",
                &[],
            )
            .await
            .map_err(|e| format!("Failed to load snapshot batch: {}", e))?
        else {
            return Ok(None);
        };
        let batch_id: Uuid = row.get(0);

        let rows = client
            .query(
                "SELECT snapshot_id, agent_id, agent_kind, agent_version, snapshot_data, created_at
                 FROM agent_snapshots WHERE batch_id = $1 ORDER BY agent_kind, agent_id",
                &[&batch_id],
            )
            .await
            .map_err(|e| format!("Failed to load snapshots: {}", e))?;

        let snapshots = rows
            .iter()
            .map(|r| Snapshot {
                snapshot_id: r.get(0),
                agent_id: r.get(1),
                agent_kind: r.get(2),
                agent_version: r.get::<_, i64>(3) as u64,
                snapshot_data: r.get(4),
                created_at: r.get(5),
            })
            .collect();

        Ok(Some(SnapshotBatch {
            batch_id,
            sim_time_ms: row.get::<_, i64>(1) as u64,
            created_at: row.get(2),
            snapshots,
        }))
    }
}
