use crate::common::{AgentAggregate, DomainError, DomainResult};
use crate::domains::collision::CollisionBody;
use crate::domains::floor::models::SleeverModel;
use crate::domains::kinematics::{Locator, Point};
use crate::domains::statistics::ActivityKind;
use serde::{Deserialize, Serialize};

use super::events::SleeverEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SleeverStatus {
    Idle,
    Busy,
    Ready,
    Empty,
    /// Reloading the gripper after a handover.
    Preparing,
    /// Parked until the paired doffer clears the way.
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SleeverOperation {
    PutDown,
    Prepare,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct OperationTimer {
    operation: SleeverOperation,
    left_ms: u64,
}

/// Mobile agent carrying fresh sleeves (and rings) to winders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sleever {
    pub id: String,
    locator: Locator,
    pub width: i64,
    pub time_put_down: u64,
    pub time_prepare: u64,
    pub sleeve_slots: u32,
    pub ring_slots: u32,
    pub status: SleeverStatus,
    sleeves: u32,
    rings: u32,
    timer: Option<OperationTimer>,
    pub version: u64,
    #[serde(skip)]
    uncommitted_events: Vec<SleeverEvent>,
}

impl Sleever {
    pub fn new(model: &SleeverModel, x: i64, y: i64) -> Self {
        Self {
            id: model.id.clone(),
            locator: Locator::new(x, y, model.speed, model.acceleration),
            width: model.width,
            time_put_down: model.time_put_down,
            time_prepare: model.time_prepare,
            sleeve_slots: model.sleeve_slots,
            ring_slots: model.rings,
            status: SleeverStatus::Idle,
            sleeves: model.sleeve_slots,
            rings: model.rings,
            timer: None,
            version: 0,
            uncommitted_events: Vec::new(),
        }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn x(&self) -> i64 {
        self.locator.x()
    }

    pub fn y(&self) -> i64 {
        self.locator.y()
    }

    pub fn height(&self) -> i64 {
        self.width / 4
    }

    pub fn destination(&self) -> Point {
        self.locator.destination()
    }

    pub fn is_moving(&self) -> bool {
        self.locator.is_moving()
    }

    pub fn session(&self) -> Option<String> {
        self.locator.session().map(str::to_string)
    }

    pub fn sleeves(&self) -> u32 {
        self.sleeves
    }

    pub fn rings(&self) -> u32 {
        self.rings
    }

    pub fn body(&self) -> CollisionBody {
        CollisionBody {
            x: self.x(),
            width: self.width,
            moving: self.is_moving(),
            heading_right: self.locator.heading_right(),
            brake_distance: self.locator.brake_distance(),
        }
    }

    pub fn set_status(&mut self, status: SleeverStatus) {
        self.status = status;
    }

    pub fn set_inventory(&mut self, sleeves: u32, rings: u32) {
        self.sleeves = sleeves;
        self.rings = rings;
    }

    /// Refill to full capacity and become available again.
    pub fn restock(&mut self) {
        self.set_inventory(self.sleeve_slots, self.ring_slots);
        self.timer = None;
        self.status = SleeverStatus::Idle;
    }

    pub fn reach(&mut self, session: Option<String>, x: i64, y: i64, notify: bool) -> bool {
        if self.status == SleeverStatus::Busy {
            return false;
        }
        let accepted = self.locator.reach(session, x, y, notify);
        self.absorb_motion();
        accepted
    }

    pub fn stop_moving(&mut self, notify: bool) {
        self.locator.stop_moving(notify);
        self.absorb_motion();
    }

    pub fn shift(&mut self, delta: i64) {
        self.locator.shift(delta);
    }

    /// Hand `sleeves` sleeves and `rings` rings over to the winder.
    pub fn put_result(&mut self, session: Option<String>, sleeves: u32, rings: u32) -> DomainResult<()> {
        if self.status != SleeverStatus::Ready {
            return Err(DomainError::InvalidCommand {
                reason: format!("sleever {} cannot hand over sleeves while {:?}", self.id, self.status),
            });
        }
        self.sleeves = self.sleeves.saturating_sub(sleeves);
        self.rings = self.rings.saturating_sub(rings);
        self.locator.set_session(session);
        self.add_event(SleeverEvent::Activity { sleever_id: self.id.clone(), kind: ActivityKind::Idle });
        self.status = SleeverStatus::Busy;
        self.timer = Some(OperationTimer { operation: SleeverOperation::PutDown, left_ms: self.time_put_down });
        Ok(())
    }

    pub fn tick(&mut self, step_ms: u64) {
        self.locator.tick(step_ms);
        self.absorb_motion();

        let Some(timer) = self.timer else { return };
        let left_ms = timer.left_ms.saturating_sub(step_ms);
        if left_ms > 0 {
            self.timer = Some(OperationTimer { left_ms, ..timer });
            return;
        }

        self.timer = None;
        match timer.operation {
            SleeverOperation::PutDown => {
                self.add_event(SleeverEvent::Activity { sleever_id: self.id.clone(), kind: ActivityKind::Busy });
                let session = self.session();
                self.status = if self.sleeves > 0 { SleeverStatus::Preparing } else { SleeverStatus::Empty };
                self.add_event(SleeverEvent::TaskCompleted { sleever_id: self.id.clone(), session });
                if self.status == SleeverStatus::Empty {
                    self.add_event(SleeverEvent::Emptied { sleever_id: self.id.clone() });
                } else {
                    self.timer = Some(OperationTimer { operation: SleeverOperation::Prepare, left_ms: self.time_prepare });
                }
            }
            SleeverOperation::Prepare => {
                if self.status == SleeverStatus::Preparing {
                    self.status = SleeverStatus::Idle;
                }
            }
        }
    }

    fn absorb_motion(&mut self) {
        for event in self.locator.take_events() {
            self.add_event(SleeverEvent::Motion { sleever_id: self.id.clone(), event });
        }
    }
}

impl AgentAggregate for Sleever {
    type Event = SleeverEvent;

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
