use crate::common::{AgentAggregate, DomainError, DomainResult};
use crate::domains::floor::models::WinderModel;
use crate::domains::kinematics::Point;
use serde::{Deserialize, Serialize};

use super::events::WinderEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinderStatus {
    Empty,
    Loaded,
    Ready,
    CutEdge,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum WinderCycle {
    Idle,
    Winding { left_ms: u64 },
    Exchanging { left_ms: u64 },
}

/// A fixed winding station. Once started it winds continuously: every wind
/// is followed by an exchange, after which the bobbins are ready (or need an
/// edge cut) and the next wind begins at once. A wind that ends while the
/// station has not been reloaded with sleeves fails the station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Winder {
    pub id: String,
    pub doffer_id: String,
    pub sleever_id: String,
    pub half_mode: bool,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub time_wind: u64,
    pub time_exchange: u64,
    pub time_alert: u64,
    pub status: WinderStatus,
    cut_edge_mode: bool,
    cycle: WinderCycle,
    pub version: u64,
    #[serde(skip)]
    uncommitted_events: Vec<WinderEvent>,
}

impl Winder {
    pub fn new(model: &WinderModel, x: i64, y: i64) -> Self {
        Self {
            id: model.id.clone(),
            doffer_id: model.doffer_id.clone(),
            sleever_id: model.sleever_id.clone(),
            half_mode: model.half_mode,
            x,
            y,
            width: model.width,
            time_wind: model.time_wind,
            time_exchange: model.time_exchange,
            time_alert: model.time_alert,
            status: WinderStatus::Empty,
            cut_edge_mode: true,
            cycle: WinderCycle::Idle,
            version: 0,
            uncommitted_events: Vec::new(),
        }
    }

    /// Bobbins produced (and sleeves consumed) per cycle.
    pub fn places(&self) -> u32 {
        if self.half_mode {
            1
        } else {
            2
        }
    }

    pub fn height(&self) -> i64 {
        self.width * 3 / 2
    }

    /// Where doffers and sleevers stop to serve this winder.
    pub fn bobbins_point(&self) -> Point {
        Point::new(self.x + self.width / 8, self.y + self.height() / 2)
    }

    pub fn is_winding(&self) -> bool {
        matches!(self.cycle, WinderCycle::Winding { .. })
    }

    pub fn cut_edge_mode(&self) -> bool {
        self.cut_edge_mode
    }

    pub fn set_cut_edge_mode(&mut self, enabled: bool) {
        self.cut_edge_mode = enabled;
    }

    pub fn set_status(&mut self, status: WinderStatus) {
        self.status = status;
    }

    /// Progress of the current wind in percent.
    pub fn readiness(&self) -> u8 {
        match self.cycle {
            WinderCycle::Winding { left_ms } if self.time_wind > 0 => {
                (100 * (self.time_wind - left_ms.min(self.time_wind)) / self.time_wind) as u8
            }
            WinderCycle::Exchanging { .. } => 100,
            _ if matches!(self.status, WinderStatus::Ready | WinderStatus::CutEdge) => 100,
            _ => 0,
        }
    }

    pub fn start_winding(&mut self) -> DomainResult<()> {
        if self.status != WinderStatus::Loaded {
            return Err(DomainError::InvalidCommand {
                reason: format!("winder {} cannot start winding while {:?}", self.id, self.status),
            });
        }
        self.cycle = WinderCycle::Winding { left_ms: self.time_wind };
        Ok(())
    }

    pub fn tick(&mut self, step_ms: u64) {
        match self.cycle {
            WinderCycle::Idle => {}
            WinderCycle::Winding { left_ms } => {
                let left = left_ms.saturating_sub(step_ms);
                if !self.cut_edge_mode && self.time_alert > 0 && left_ms > self.time_alert && left <= self.time_alert {
                    self.add_event(WinderEvent::AlertReached { winder_id: self.id.clone() });
                }
                if left > 0 {
                    self.cycle = WinderCycle::Winding { left_ms: left };
                } else if self.status != WinderStatus::Loaded {
                    self.cycle = WinderCycle::Idle;
                    self.status = WinderStatus::Fail;
                    self.add_event(WinderEvent::WindingFailed { winder_id: self.id.clone() });
                } else {
                    self.cycle = WinderCycle::Exchanging { left_ms: self.time_exchange };
                }
            }
            WinderCycle::Exchanging { left_ms } => {
                let left = left_ms.saturating_sub(step_ms);
                if left > 0 {
                    self.cycle = WinderCycle::Exchanging { left_ms: left };
                    return;
                }
                if self.cut_edge_mode {
                    self.status = WinderStatus::CutEdge;
                    self.add_event(WinderEvent::CutEdgeNeeded { winder_id: self.id.clone() });
                } else {
                    self.status = WinderStatus::Ready;
                    self.add_event(WinderEvent::BobbinsReady { winder_id: self.id.clone() });
                }
                self.cycle = WinderCycle::Winding { left_ms: self.time_wind };
            }
        }
    }

    pub fn stop(&mut self) {
        self.cycle = WinderCycle::Idle;
    }
}

impl AgentAggregate for Winder {
    type Event = WinderEvent;

    fn agent_id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn mark_events_as_committed(&mut self) {
        self.uncommitted_events.clear();
    }

    fn add_event(&mut self, event: Self::Event) {
        self.version += 1;
        self.uncommitted_events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> WinderModel {
        WinderModel {
            id: "W_1".into(),
            doffer_id: "D_1".into(),
            sleever_id: "S_1".into(),
            half_mode: false,
            time_wind: 1000,
            time_exchange: 200,
            time_alert: 300,
            width: 800,
        }
    }

    #[test]
    fn cannot_wind_unless_loaded() {
        let mut winder = Winder::new(&model(), 0, 0);
        assert!(winder.start_winding().is_err());
        assert_eq!(winder.places(), 2);
        assert_eq!(winder.bobbins_point(), Point::new(100, 600));
    }

    #[test]
    fn wind_exchange_and_alert() {
        let mut winder = Winder::new(&model(), 0, 0);
        winder.set_cut_edge_mode(false);
        winder.set_status(WinderStatus::Loaded);
        winder.start_winding().unwrap();

        for _ in 0..6 {
            winder.tick(100);
        }
        assert_eq!(winder.readiness(), 60);
        assert!(winder.take_events().is_empty());

        winder.tick(100);
        assert!(matches!(winder.take_events().as_slice(), [WinderEvent::AlertReached { .. }]));

        for _ in 0..3 {
            winder.tick(100);
        }
        assert!(!winder.is_winding());
        assert_eq!(winder.status, WinderStatus::Loaded);

        winder.tick(100);
        winder.tick(100);
        assert_eq!(winder.status, WinderStatus::Ready);
        assert!(matches!(winder.take_events().as_slice(), [WinderEvent::BobbinsReady { .. }]));
        assert!(winder.is_winding());
    }

    #[test]
    fn first_cycle_needs_an_edge_cut() {
        let mut winder = Winder::new(&model(), 0, 0);
        winder.set_status(WinderStatus::Loaded);
        winder.start_winding().unwrap();
        for _ in 0..12 {
            winder.tick(100);
        }
        assert_eq!(winder.status, WinderStatus::CutEdge);
        let events = winder.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], WinderEvent::CutEdgeNeeded { .. }));
    }

    #[test]
    fn unloaded_winder_fails_at_end_of_wind() {
        let mut winder = Winder::new(&model(), 0, 0);
        winder.set_status(WinderStatus::Loaded);
        winder.start_winding().unwrap();
        winder.set_status(WinderStatus::Ready);
        for _ in 0..10 {
            winder.tick(100);
        }
        assert_eq!(winder.status, WinderStatus::Fail);
        assert!(!winder.is_winding());
        assert!(matches!(winder.take_events().as_slice(), [WinderEvent::WindingFailed { .. }]));
    }
}
