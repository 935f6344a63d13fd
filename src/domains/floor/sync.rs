use crate::common::{DomainResult, Snapshot, SnapshotBatch};
use crate::domains::doffer::DofferStatus;
use crate::domains::sleever::SleeverStatus;
use crate::domains::tasks::{TaskSession, TaskStatus, TaskType};
use serde::{Deserialize, Serialize};

use super::context::Floor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DofferSnapshot {
    pub x: i64,
    pub speed: i64,
    pub status: DofferStatus,
    pub winder_id: Option<String>,
    pub spooler_id: Option<String>,
    pub row: Option<usize>,
    pub column: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleeverSnapshot {
    pub x: i64,
    pub speed: i64,
    pub status: SleeverStatus,
    pub sleeves: u32,
    pub rings: u32,
    pub winder_id: Option<String>,
}

impl Floor {
    /// Capture every doffer and sleever together with the task it is
    /// currently running.
    pub fn snapshot_batch(&self) -> DomainResult<SnapshotBatch> {
        let mut snapshots = Vec::with_capacity(self.doffers.len() + self.sleevers.len());

        for doffer in self.doffers.values() {
            let task = self.running_task(&doffer.id, &[TaskType::DeliverBobbins, TaskType::MoveDofferSleever]);
            let cell = task.and_then(|t| t.reservations.first());
            let data = DofferSnapshot {
                x: doffer.x(),
                speed: doffer.locator().speed(),
                status: doffer.status,
                winder_id: task.and_then(|t| t.object_id.clone()),
                spooler_id: cell.map(|c| c.spooler_id.clone()),
                row: cell.map(|c| c.row),
                column: cell.map(|c| c.column),
            };
            snapshots.push(Snapshot::new(&doffer.id, "doffer", doffer.version, &data)?);
        }

        for sleever in self.sleevers.values() {
            let task = self.running_task(&sleever.id, &[TaskType::DeliverSleeve, TaskType::MoveSleever]);
            let data = SleeverSnapshot {
                x: sleever.x(),
                speed: sleever.locator().speed(),
                status: sleever.status,
                sleeves: sleever.sleeves(),
                rings: sleever.rings(),
                winder_id: task.and_then(|t| t.object_id.clone()),
            };
            snapshots.push(Snapshot::new(&sleever.id, "sleever", sleever.version, &data)?);
        }

        Ok(SnapshotBatch::new(self.clock.now_ms(), snapshots))
    }

    fn running_task(&self, assignee_id: &str, types: &[TaskType]) -> Option<&TaskSession> {
        self.registry.iter().find(|t| {
            t.assignee_id == assignee_id && t.status == TaskStatus::Progress && types.contains(&t.task_type)
        })
    }
}
