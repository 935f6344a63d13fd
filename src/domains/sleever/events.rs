use crate::common::DomainEvent;
use crate::domains::kinematics::MotionEvent;
use crate::domains::statistics::ActivityKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SleeverEvent {
    Motion { sleever_id: String, event: MotionEvent },
    /// Sleeves were handed over to the winder.
    TaskCompleted { sleever_id: String, session: Option<String> },
    /// The onboard inventory ran out.
    Emptied { sleever_id: String },
    Activity { sleever_id: String, kind: ActivityKind },
}

impl DomainEvent for SleeverEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SleeverEvent::Motion { event, .. } => event.name(),
            SleeverEvent::TaskCompleted { .. } => "SleeverTaskCompleted",
            SleeverEvent::Emptied { .. } => "SleeverEmptied",
            SleeverEvent::Activity { .. } => "SleeverActivity",
        }
    }

    fn agent_id(&self) -> &str {
        match self {
            SleeverEvent::Motion { sleever_id, .. }
            | SleeverEvent::TaskCompleted { sleever_id, .. }
            | SleeverEvent::Emptied { sleever_id }
            | SleeverEvent::Activity { sleever_id, .. } => sleever_id,
        }
    }
}
