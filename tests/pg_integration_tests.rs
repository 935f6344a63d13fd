#[cfg(feature = "pg_integration")]
use winding_floor::adapters::outbound::PostgresSnapshotStore;
#[cfg(feature = "pg_integration")]
use winding_floor::common::{Snapshot, SnapshotBatch, SnapshotStore};
#[cfg(feature = "pg_integration")]
use winding_floor::config::PostgresConfig;

// Needs a running Postgres. PG_TEST_PORT selects the port (default 5433).
#[cfg(feature = "pg_integration")]
#[tokio::test]
async fn test_postgres_snapshot_store_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let port = std::env::var("PG_TEST_PORT").ok().and_then(|s| s.parse::<u16>().ok()).unwrap_or(5433u16);
    let config = PostgresConfig {
        host: "127.0.0.1".to_string(),
        port,
        database: "postgres".to_string(),
        username: "postgres".to_string(),
        password: "postgres".to_string(),
        max_connections: 2,
    };

    // Wait for Postgres to accept connections (simple retry loop)
    let mut store = None;
    for _ in 0..10 {
        match PostgresSnapshotStore::new(config.clone()).await {
            Ok(s) => {
                store = Some(s);
                break;
            }
            Err(_) => tokio::time::sleep(std::time::Duration::from_millis(500)).await,
        }
    }
    let store = store.ok_or("Postgres did not become ready")?;

    let doffer = Snapshot::new("D_1", "doffer", 7, &serde_json::json!({ "x": 4200, "status": "Deliver" }))?;
    let sim_time_ms = u64::from(u32::MAX) + 1;
    let batch = SnapshotBatch::new(sim_time_ms, vec![doffer]);
    let batch_id = batch.batch_id;
    store.save_batch(batch).await?;

    let latest = store.latest_batch().await?.ok_or("no batch stored")?;
    assert_eq!(latest.batch_id, batch_id);
    assert_eq!(latest.snapshots.len(), 1);
    assert_eq!(latest.snapshots[0].agent_version, 7);
    assert_eq!(latest.snapshots[0].snapshot_data["x"], 4200);

    Ok(())
}
