use crate::domains::doffer::DofferStatus;
use crate::domains::man_service::{Chore, ManStatus};
use crate::domains::sleever::SleeverStatus;
use crate::domains::spooler::{CellTally, SpoolerStatus};
use crate::domains::tasks::{TaskStatus, TaskType};
use crate::domains::winder::WinderStatus;
use serde::Serialize;

use super::context::Floor;

#[derive(Debug, Clone, Serialize)]
pub struct WinderView {
    pub id: String,
    pub x: i64,
    pub width: i64,
    pub status: WinderStatus,
    pub readiness: u8,
    pub cut_edge_mode: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DofferView {
    pub id: String,
    pub x: i64,
    pub width: i64,
    pub destination_x: i64,
    pub moving: bool,
    pub speed: i64,
    pub status: DofferStatus,
    pub amount: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SleeverView {
    pub id: String,
    pub x: i64,
    pub width: i64,
    pub destination_x: i64,
    pub moving: bool,
    pub speed: i64,
    pub status: SleeverStatus,
    pub sleeves: u32,
    pub rings: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManView {
    pub id: String,
    pub x: i64,
    pub moving: bool,
    pub status: ManStatus,
    pub chore: Option<Chore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpoolerView {
    pub id: String,
    pub x: i64,
    pub width: i64,
    pub status: SpoolerStatus,
    pub active_side: usize,
    pub cells: CellTally,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: String,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub assignee_id: String,
    pub object_id: Option<String>,
}

/// Read-only picture of the floor at one instant, for reports and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct FloorView {
    pub time_ms: u64,
    pub winders: Vec<WinderView>,
    pub doffers: Vec<DofferView>,
    pub sleevers: Vec<SleeverView>,
    pub men: Vec<ManView>,
    pub spoolers: Vec<SpoolerView>,
    pub service_zones: Vec<i64>,
    pub open_tasks: Vec<TaskView>,
}

impl Floor {
    pub fn view(&self) -> FloorView {
        FloorView {
            time_ms: self.clock.now_ms(),
            winders: self
                .winder_order
                .iter()
                .filter_map(|id| self.winders.get(id))
                .map(|w| WinderView {
                    id: w.id.clone(),
                    x: w.x,
                    width: w.width,
                    status: w.status,
                    readiness: w.readiness(),
                    cut_edge_mode: w.cut_edge_mode(),
                })
                .collect(),
            doffers: self
                .doffers
                .values()
                .map(|d| DofferView {
                    id: d.id.clone(),
                    x: d.x(),
                    width: d.width,
                    destination_x: d.destination().x,
                    moving: d.is_moving(),
                    speed: d.locator().speed(),
                    status: d.status,
                    amount: d.amount(),
                })
                .collect(),
            sleevers: self
                .sleevers
                .values()
                .map(|s| SleeverView {
                    id: s.id.clone(),
                    x: s.x(),
                    width: s.width,
                    destination_x: s.destination().x,
                    moving: s.is_moving(),
                    speed: s.locator().speed(),
                    status: s.status,
                    sleeves: s.sleeves(),
                    rings: s.rings(),
                })
                .collect(),
            men: self
                .men
                .values()
                .map(|m| ManView {
                    id: m.id.clone(),
                    x: m.x(),
                    moving: m.is_moving(),
                    status: m.status,
                    chore: m.current_chore(),
                })
                .collect(),
            spoolers: self
                .spooler_order
                .iter()
                .filter_map(|id| self.spoolers.get(id))
                .map(|s| SpoolerView {
                    id: s.id.clone(),
                    x: s.x,
                    width: s.width(),
                    status: s.status,
                    active_side: s.active_side(),
                    cells: s.tally(),
                })
                .collect(),
            service_zones: self.service_zones.clone(),
            open_tasks: self
                .registry
                .iter()
                .filter(|t| !t.status.is_finished())
                .map(|t| TaskView {
                    id: t.id.clone(),
                    task_type: t.task_type,
                    status: t.status,
                    assignee_id: t.assignee_id.clone(),
                    object_id: t.object_id.clone(),
                })
                .collect(),
        }
    }
}
