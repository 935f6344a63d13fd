use crate::common::DomainEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WinderEvent {
    /// Winding is about to finish; service can be positioned ahead of time.
    AlertReached { winder_id: String },
    BobbinsReady { winder_id: String },
    CutEdgeNeeded { winder_id: String },
    /// The wind ended while the winder was not loaded.
    WindingFailed { winder_id: String },
}

impl DomainEvent for WinderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WinderEvent::AlertReached { .. } => "WinderAlertReached",
            WinderEvent::BobbinsReady { .. } => "WinderBobbinsReady",
            WinderEvent::CutEdgeNeeded { .. } => "WinderCutEdgeNeeded",
            WinderEvent::WindingFailed { .. } => "WinderFailed",
        }
    }

    fn agent_id(&self) -> &str {
        match self {
            WinderEvent::AlertReached { winder_id }
            | WinderEvent::BobbinsReady { winder_id }
            | WinderEvent::CutEdgeNeeded { winder_id }
            | WinderEvent::WindingFailed { winder_id } => winder_id,
        }
    }
}
