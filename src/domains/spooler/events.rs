use crate::common::DomainEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SpoolerEvent {
    /// No free or reserved cell remains on the active side.
    FilledUp { spooler_id: String },
}

impl DomainEvent for SpoolerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SpoolerEvent::FilledUp { .. } => "SpoolerFilledUp",
        }
    }

    fn agent_id(&self) -> &str {
        match self {
            SpoolerEvent::FilledUp { spooler_id } => spooler_id,
        }
    }
}
