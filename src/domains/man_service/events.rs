use crate::common::DomainEvent;
use crate::domains::kinematics::MotionEvent;
use crate::domains::statistics::ActivityKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ManServiceEvent {
    Motion { man_id: String, event: MotionEvent },
    TaskCompleted { man_id: String, session: Option<String> },
    Activity { man_id: String, kind: ActivityKind },
}

impl DomainEvent for ManServiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ManServiceEvent::Motion { event, .. } => event.name(),
            ManServiceEvent::TaskCompleted { .. } => "ManTaskCompleted",
            ManServiceEvent::Activity { .. } => "ManActivity",
        }
    }

    fn agent_id(&self) -> &str {
        match self {
            ManServiceEvent::Motion { man_id, .. }
            | ManServiceEvent::TaskCompleted { man_id, .. }
            | ManServiceEvent::Activity { man_id, .. } => man_id,
        }
    }
}
