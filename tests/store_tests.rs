use serde_json::json;
use winding_floor::adapters::inbound::{FileSnapshotStore, InMemorySnapshotStore};
use winding_floor::common::{Snapshot, SnapshotBatch, SnapshotStore};

fn batch(sim_time_ms: u64, x: i64) -> SnapshotBatch {
    let doffer = Snapshot::new("D_1", "doffer", 3, &json!({ "x": x, "status": "Idle" })).unwrap();
    let sleever = Snapshot::new("S_1", "sleever", 1, &json!({ "x": x + 2000, "sleeves": 20 })).unwrap();
    SnapshotBatch::new(sim_time_ms, vec![doffer, sleever])
}

#[tokio::test]
async fn memory_store_keeps_batches_in_order() {
    let store = InMemorySnapshotStore::new();
    assert!(store.latest_batch().await.unwrap().is_none());

    store.save_batch(batch(1_000, 100)).await.unwrap();
    store.save_batch(batch(2_000, 200)).await.unwrap();

    assert_eq!(store.batch_count().await, 2);
    let latest = store.latest_batch().await.unwrap().unwrap();
    assert_eq!(latest.sim_time_ms, 2_000);
    assert_eq!(latest.len(), 2);
}

#[tokio::test]
async fn file_store_appends_one_line_per_batch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("snapshots.jsonl");
    let store = FileSnapshotStore::new(&path);

    assert!(store.latest_batch().await.unwrap().is_none());

    let first = batch(1_000, 100);
    let first_id = first.batch_id;
    store.save_batch(first).await.unwrap();
    store.save_batch(batch(2_000, 200)).await.unwrap();

    let content = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(content.lines().count(), 2);

    let all = store.load_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].batch_id, first_id);

    let latest = store.latest_batch().await.unwrap().unwrap();
    assert_eq!(latest.sim_time_ms, 2_000);
    let doffer = latest.snapshots.iter().find(|s| s.agent_id == "D_1").unwrap();
    assert_eq!(doffer.snapshot_data["x"], 200);
}

#[tokio::test]
async fn file_store_skips_torn_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshots.jsonl");
    let store = FileSnapshotStore::new(&path);

    store.save_batch(batch(1_000, 100)).await.unwrap();
    let mut content = tokio::fs::read_to_string(&path).await.unwrap();
    content.push_str("{\"batch_id\": \"not-a-batch\n");
    tokio::fs::write(&path, content).await.unwrap();

    let all = store.load_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].sim_time_ms, 1_000);
}
