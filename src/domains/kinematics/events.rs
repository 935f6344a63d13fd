use serde::{Deserialize, Serialize};

/// Raw notifications from a [`Locator`](super::Locator). The owning agent
/// wraps them into its own event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionEvent {
    /// Motion began; the agent stopped being idle.
    Departed,
    /// Position changed during a tick. `delta` is signed along the x axis.
    Moved { x: i64, delta: i64 },
    /// Motion ended, with or without arrival.
    Halted,
    /// The destination was reached and arrival notification was requested.
    Arrived { session: Option<String> },
}

impl MotionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MotionEvent::Departed => "Departed",
            MotionEvent::Moved { .. } => "Moved",
            MotionEvent::Halted => "Halted",
            MotionEvent::Arrived { .. } => "Arrived",
        }
    }
}
