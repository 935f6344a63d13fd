use crate::common::DomainEvent;
use crate::domains::kinematics::MotionEvent;
use crate::domains::statistics::ActivityKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DofferEvent {
    Motion { doffer_id: String, event: MotionEvent },
    /// Bobbins were taken from the winder and are now carried.
    BobbinsAboard { doffer_id: String, session: Option<String> },
    /// One bobbin was put down; more remain aboard.
    BobbinPlaced { doffer_id: String, session: Option<String> },
    /// The last bobbin was put down.
    TaskCompleted { doffer_id: String, session: Option<String> },
    /// An interval of the given kind just closed.
    Activity { doffer_id: String, kind: ActivityKind },
}

impl DomainEvent for DofferEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DofferEvent::Motion { event, .. } => event.name(),
            DofferEvent::BobbinsAboard { .. } => "DofferBobbinsAboard",
            DofferEvent::BobbinPlaced { .. } => "DofferBobbinPlaced",
            DofferEvent::TaskCompleted { .. } => "DofferTaskCompleted",
            DofferEvent::Activity { .. } => "DofferActivity",
        }
    }

    fn agent_id(&self) -> &str {
        match self {
            DofferEvent::Motion { doffer_id, .. }
            | DofferEvent::BobbinsAboard { doffer_id, .. }
            | DofferEvent::BobbinPlaced { doffer_id, .. }
            | DofferEvent::TaskCompleted { doffer_id, .. }
            | DofferEvent::Activity { doffer_id, .. } => doffer_id,
        }
    }
}
