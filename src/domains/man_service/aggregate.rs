use crate::common::{AgentAggregate, DomainError, DomainResult};
use crate::domains::floor::models::ManServiceModel;
use crate::domains::kinematics::Locator;
use crate::domains::statistics::ActivityKind;
use serde::{Deserialize, Serialize};

use super::events::ManServiceEvent;

pub const MAN_WIDTH: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManStatus {
    Idle,
    Ready,
    Busy,
}

/// The fixed-duration jobs a service man performs on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Chore {
    StartWinder,
    RotateSpooler,
    ChangeSpooler,
    LoadSleever,
    CutEdge,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChoreDurations {
    pub start_winder: u64,
    pub rotate_spooler: u64,
    pub change_spooler: u64,
    pub load_sleever: u64,
    pub cut_edge: u64,
}

impl ChoreDurations {
    pub fn of(&self, chore: Chore) -> u64 {
        match chore {
            Chore::StartWinder => self.start_winder,
            Chore::RotateSpooler => self.rotate_spooler,
            Chore::ChangeSpooler => self.change_spooler,
            Chore::LoadSleever => self.load_sleever,
            Chore::CutEdge => self.cut_edge,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ChoreTimer {
    chore: Chore,
    left_ms: u64,
}

/// Human service agent. Walks at constant speed and performs one chore at a
/// time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManService {
    pub id: String,
    locator: Locator,
    pub durations: ChoreDurations,
    pub status: ManStatus,
    timer: Option<ChoreTimer>,
    pub version: u64,
    #[serde(skip)]
    uncommitted_events: Vec<ManServiceEvent>,
}

impl ManService {
    pub fn new(model: &ManServiceModel, x: i64, y: i64) -> Self {
        Self {
            id: model.id.clone(),
            locator: Locator::new(x, y, model.speed, 0),
            durations: ChoreDurations {
                start_winder: model.time_start_winder,
                rotate_spooler: model.time_rotate_spooler,
                change_spooler: model.time_change_spooler,
                load_sleever: model.time_load_sleever,
                cut_edge: model.time_cut_edge,
            },
            status: ManStatus::Idle,
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

    pub fn width(&self) -> i64 {
        MAN_WIDTH
    }

    pub fn is_moving(&self) -> bool {
        self.locator.is_moving()
    }

    pub fn session(&self) -> Option<String> {
        self.locator.session().map(str::to_string)
    }

    pub fn current_chore(&self) -> Option<Chore> {
        self.timer.map(|t| t.chore)
    }

    pub fn set_status(&mut self, status: ManStatus) {
        self.status = status;
    }

    /// Walk to `x`. A walk in progress is abandoned and restarted from the
    /// current position.
    pub fn reach(&mut self, session: Option<String>, x: i64, y: i64) -> bool {
        if self.locator.max_speed() <= 0 || self.status == ManStatus::Busy {
            return false;
        }
        if self.locator.is_moving() {
            self.locator.abort();
        }
        let accepted = self.locator.reach(session, x, y, true);
        self.absorb_motion();
        accepted
    }

    pub fn stop_moving(&mut self, notify: bool) {
        self.locator.stop_moving(notify);
        self.absorb_motion();
    }

    pub fn perform(&mut self, session: Option<String>, chore: Chore) -> DomainResult<()> {
        if self.status != ManStatus::Ready {
            return Err(DomainError::InvalidCommand {
                reason: format!("man {} cannot start {:?} while {:?}", self.id, chore, self.status),
            });
        }
        self.locator.set_session(session);
        self.add_event(ManServiceEvent::Activity { man_id: self.id.clone(), kind: ActivityKind::Idle });
        self.status = ManStatus::Busy;
        self.timer = Some(ChoreTimer { chore, left_ms: self.durations.of(chore) });
        Ok(())
    }

    pub fn tick(&mut self, step_ms: u64) {
        self.locator.tick(step_ms);
        self.absorb_motion();

        let Some(timer) = self.timer else { return };
        let left_ms = timer.left_ms.saturating_sub(step_ms);
        if left_ms > 0 {
            self.timer = Some(ChoreTimer { left_ms, ..timer });
            return;
        }

        self.timer = None;
        self.status = ManStatus::Idle;
        self.add_event(ManServiceEvent::Activity { man_id: self.id.clone(), kind: ActivityKind::Busy });
        self.add_event(ManServiceEvent::TaskCompleted { man_id: self.id.clone(), session: self.session() });
    }

    fn absorb_motion(&mut self) {
        for event in self.locator.take_events() {
            self.add_event(ManServiceEvent::Motion { man_id: self.id.clone(), event });
        }
    }
}

impl AgentAggregate for ManService {
    type Event = ManServiceEvent;

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

    fn man() -> ManService {
        let model = ManServiceModel {
            id: "Man_1".into(),
            speed: 1000,
            time_start_winder: 140,
            time_rotate_spooler: 70,
            time_change_spooler: 70,
            time_load_sleever: 70,
            time_cut_edge: 70,
        };
        ManService::new(&model, 0, 0)
    }

    #[test]
    fn walks_then_performs_a_chore() {
        let mut man = man();
        assert!(man.reach(Some("t".into()), 700, 0));
        for _ in 0..10 {
            man.tick(70);
        }
        assert_eq!(man.x(), 700);
        let events = man.take_events();
        assert!(events.iter().any(|e| matches!(
            e,
            ManServiceEvent::Motion { event: MotionEvent::Arrived { session: Some(s) }, .. } if s == "t"
        )));

        assert!(man.perform(Some("t".into()), Chore::StartWinder).is_err());
        man.set_status(ManStatus::Ready);
        man.perform(Some("t".into()), Chore::StartWinder).unwrap();
        assert!(!man.reach(Some("u".into()), 0, 0));

        man.tick(70);
        man.tick(70);
        assert_eq!(man.status, ManStatus::Idle);
        assert!(man.take_events().iter().any(|e| matches!(e, ManServiceEvent::TaskCompleted { .. })));
    }

    #[test]
    fn retarget_restarts_from_current_position() {
        let mut man = man();
        man.reach(Some("a".into()), 7_000, 0);
        for _ in 0..10 {
            man.tick(70);
        }
        assert!(man.reach(Some("b".into()), 0, 0));
        assert!(man.is_moving());
        for _ in 0..10 {
            man.tick(70);
        }
        assert_eq!(man.x(), 0);
        assert_eq!(man.session().as_deref(), Some("b"));
    }
}
