use crate::common::{AgentAggregate, DomainError, DomainResult};
use crate::domains::collision::CollisionBody;
use crate::domains::floor::models::DofferModel;
use crate::domains::kinematics::{Locator, Point};
use crate::domains::statistics::ActivityKind;
use serde::{Deserialize, Serialize};

use super::events::DofferEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DofferStatus {
    Idle,
    Deliver,
    Ready,
    Busy,
    /// Parked until the paired sleever clears the way.
    Wait,
    /// Parked next to a winder until its bobbins are ready.
    WaitWinder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DofferOperation {
    GetIn,
    PutDown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PayloadTimer {
    operation: DofferOperation,
    left_ms: u64,
}

/// Mobile agent collecting finished bobbins from winders and carrying them
/// to reserved spooler cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doffer {
    pub id: String,
    locator: Locator,
    pub width: i64,
    pub time_get_in: u64,
    pub time_put_down: u64,
    pub status: DofferStatus,
    amount: u32,
    timer: Option<PayloadTimer>,
    pub version: u64,
    #[serde(skip)]
    uncommitted_events: Vec<DofferEvent>,
}

impl Doffer {
    pub fn new(model: &DofferModel, x: i64, y: i64) -> Self {
        Self {
            id: model.id.clone(),
            locator: Locator::new(x, y, model.speed, model.acceleration),
            width: model.width,
            time_get_in: model.time_get_in,
            time_put_down: model.time_put_down,
            status: DofferStatus::Idle,
            amount: 0,
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

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn operation(&self) -> Option<DofferOperation> {
        self.timer.map(|t| t.operation)
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

    pub fn set_status(&mut self, status: DofferStatus) {
        self.status = status;
    }

    pub fn reset_amount(&mut self) {
        self.amount = 0;
    }

    pub fn reach(&mut self, session: Option<String>, x: i64, y: i64, notify: bool) -> bool {
        if self.status == DofferStatus::Busy {
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

    /// Carried along by the agent this doffer is linked to.
    pub fn shift(&mut self, delta: i64) {
        self.locator.shift(delta);
    }

    /// Take `amount` bobbins from the winder the doffer stands at.
    pub fn get_result(&mut self, session: Option<String>, amount: u32) -> DomainResult<()> {
        if self.status != DofferStatus::Ready {
            return Err(self.rejected("take bobbins"));
        }
        self.amount = amount;
        self.begin(session, DofferOperation::GetIn, self.time_get_in);
        Ok(())
    }

    /// Put one of the `amount` carried bobbins into the cell underneath.
    pub fn put_result(&mut self, session: Option<String>, amount: u32) -> DomainResult<()> {
        if self.status != DofferStatus::Deliver {
            return Err(self.rejected("put down a bobbin"));
        }
        self.amount = amount;
        self.begin(session, DofferOperation::PutDown, self.time_put_down);
        Ok(())
    }

    pub fn tick(&mut self, step_ms: u64) {
        self.locator.tick(step_ms);
        self.absorb_motion();

        let Some(timer) = self.timer else { return };
        let left_ms = timer.left_ms.saturating_sub(step_ms);
        if left_ms > 0 {
            self.timer = Some(PayloadTimer { left_ms, ..timer });
            return;
        }

        self.timer = None;
        self.add_event(DofferEvent::Activity { doffer_id: self.id.clone(), kind: ActivityKind::Busy });
        let session = self.session();
        match timer.operation {
            DofferOperation::GetIn => {
                self.status = DofferStatus::Deliver;
                self.add_event(DofferEvent::BobbinsAboard { doffer_id: self.id.clone(), session });
            }
            DofferOperation::PutDown => {
                self.amount = self.amount.saturating_sub(1);
                if self.amount > 0 {
                    self.status = DofferStatus::Deliver;
                    self.add_event(DofferEvent::BobbinPlaced { doffer_id: self.id.clone(), session });
                } else {
                    self.status = DofferStatus::Idle;
                    self.add_event(DofferEvent::TaskCompleted { doffer_id: self.id.clone(), session });
                }
            }
        }
    }

    fn begin(&mut self, session: Option<String>, operation: DofferOperation, duration_ms: u64) {
        self.locator.set_session(session);
        self.add_event(DofferEvent::Activity { doffer_id: self.id.clone(), kind: ActivityKind::Idle });
        self.status = DofferStatus::Busy;
        self.timer = Some(PayloadTimer { operation, left_ms: duration_ms });
    }

    fn absorb_motion(&mut self) {
        for event in self.locator.take_events() {
            self.add_event(DofferEvent::Motion { doffer_id: self.id.clone(), event });
        }
    }

    fn rejected(&self, action: &str) -> DomainError {
        DomainError::InvalidCommand {
            reason: format!("doffer {} cannot {} while {:?}", self.id, action, self.status),
        }
    }
}

impl AgentAggregate for Doffer {
    type Event = DofferEvent;

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
    use crate::domains::kinematics::MotionEvent;

    fn doffer() -> Doffer {
        let model = DofferModel {
            id: "D_1".into(),
            speed: 500,
            acceleration: 250,
            time_get_in: 140,
            time_put_down: 70,
            width: 1200,
        };
        Doffer::new(&model, 0, 0)
    }

    #[test]
    fn busy_doffer_refuses_to_move() {
        let mut doffer = doffer();
        doffer.set_status(DofferStatus::Ready);
        doffer.get_result(Some("t".into()), 2).unwrap();
        assert_eq!(doffer.status, DofferStatus::Busy);
        assert!(!doffer.reach(Some("t".into()), 1000, 0, true));
        assert!(!doffer.is_moving());
    }

    #[test]
    fn payload_requires_matching_status() {
        let mut doffer = doffer();
        assert!(doffer.get_result(None, 2).is_err());
        assert!(doffer.put_result(None, 2).is_err());
    }

    #[test]
    fn collect_then_deliver_each_unit() {
        let mut doffer = doffer();
        doffer.set_status(DofferStatus::Ready);
        doffer.get_result(Some("t".into()), 2).unwrap();
        doffer.tick(70);
        doffer.tick(70);
        assert_eq!(doffer.status, DofferStatus::Deliver);
        assert!(doffer
            .take_events()
            .iter()
            .any(|e| matches!(e, DofferEvent::BobbinsAboard { session: Some(s), .. } if s == "t")));

        doffer.put_result(Some("t".into()), 2).unwrap();
        doffer.tick(70);
        assert_eq!(doffer.status, DofferStatus::Deliver);
        assert_eq!(doffer.amount(), 1);
        assert!(doffer.take_events().iter().any(|e| matches!(e, DofferEvent::BobbinPlaced { .. })));

        doffer.put_result(Some("t".into()), 1).unwrap();
        doffer.tick(70);
        assert_eq!(doffer.status, DofferStatus::Idle);
        assert!(doffer.take_events().iter().any(|e| matches!(e, DofferEvent::TaskCompleted { .. })));
    }

    #[test]
    fn motion_events_are_wrapped() {
        let mut doffer = doffer();
        assert!(doffer.reach(Some("t".into()), 0, 0, true));
        let events = doffer.take_events();
        assert!(matches!(
            events.as_slice(),
            [DofferEvent::Motion { event: MotionEvent::Arrived { .. }, .. }]
        ));
    }
}
