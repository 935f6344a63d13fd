use crate::domains::kinematics::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    New,
    Progress,
    Paused,
    Cancelled,
    Done,
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Cancelled | TaskStatus::Done)
    }

    pub fn is_startable(&self) -> bool {
        matches!(self, TaskStatus::New | TaskStatus::Paused)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Progress | TaskStatus::Paused)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    StartWinder,
    RotateSpooler,
    ChangeSpooler,
    LoadSleever,
    CutEdgeWinder,
    DeliverBobbins,
    MoveDofferSleever,
    DeliverSleeve,
    MoveSleever,
    HandleCollision,
}

/// Which runner drives a task type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunner {
    ManService,
    Doffering,
    Sleever,
    Collision,
}

impl TaskType {
    pub fn runner(&self) -> TaskRunner {
        match self {
            TaskType::StartWinder
            | TaskType::RotateSpooler
            | TaskType::ChangeSpooler
            | TaskType::LoadSleever
            | TaskType::CutEdgeWinder => TaskRunner::ManService,
            TaskType::DeliverBobbins | TaskType::MoveDofferSleever => TaskRunner::Doffering,
            TaskType::DeliverSleeve | TaskType::MoveSleever => TaskRunner::Sleever,
            TaskType::HandleCollision => TaskRunner::Collision,
        }
    }

    pub fn is_man_task(&self) -> bool {
        self.runner() == TaskRunner::ManService
    }
}

/// One reserved spooler cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpoolerReservation {
    pub spooler_id: String,
    pub row: usize,
    pub column: usize,
}

/// A unit of work tracked by the scheduler.
///
/// `places` depends on the type: the number of bobbins or sleeves to move,
/// or for collision tasks 1 when the doffer won and 0 when the sleever did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSession {
    pub id: String,
    pub status: TaskStatus,
    pub task_type: TaskType,
    pub assignee_id: String,
    pub object_id: Option<String>,
    pub places: u32,
    pub reservations: Vec<SpoolerReservation>,
    pub linked: Vec<String>,
    pub dest_point: Option<Point>,
    pub wait_doffer: bool,
    pub wait_sleever: bool,
}

impl TaskSession {
    pub fn new(task_type: TaskType, assignee_id: &str, object_id: Option<&str>, places: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: TaskStatus::New,
            task_type,
            assignee_id: assignee_id.to_string(),
            object_id: object_id.map(str::to_string),
            places,
            reservations: Vec::new(),
            linked: Vec::new(),
            dest_point: None,
            wait_doffer: false,
            wait_sleever: false,
        }
    }

    pub fn collision(doffer_id: &str, sleever_id: &str, doffer_wins: bool, wait_doffer: bool, wait_sleever: bool) -> Self {
        let mut session = Self::new(TaskType::HandleCollision, doffer_id, Some(sleever_id), u32::from(doffer_wins));
        session.wait_doffer = wait_doffer;
        session.wait_sleever = wait_sleever;
        session
    }

    pub fn object(&self) -> &str {
        self.object_id.as_deref().unwrap_or_default()
    }

    pub fn doffer_has_priority(&self) -> bool {
        self.places != 0
    }

    pub fn is_linked(&self, agent_id: &str) -> bool {
        self.linked.iter().any(|id| id == agent_id)
    }

    /// Whether `agent_id` is involved in this task as assignee, object or link.
    pub fn involves(&self, agent_id: &str) -> bool {
        self.assignee_id == agent_id || self.object_id.as_deref() == Some(agent_id) || self.is_linked(agent_id)
    }
}
