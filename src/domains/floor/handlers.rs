use crate::domains::collision::{extents, sidestep};
use crate::domains::doffer::{DofferEvent, DofferStatus};
use crate::domains::kinematics::MotionEvent;
use crate::domains::man_service::{Chore, ManServiceEvent};
use crate::domains::sleever::{SleeverEvent, SleeverStatus};
use crate::domains::spooler::{SpoolerEvent, SpoolerStatus};
use crate::domains::statistics::ActivityKind;
use crate::domains::tasks::{TaskSession, TaskStatus, TaskType};
use crate::domains::winder::{WinderEvent, WinderStatus};

use super::assignment::ManStrategy;
use super::context::{Floor, FloorEvent};
use super::linking::LinkedKind;

impl Floor {
    pub(crate) fn handle_event(&mut self, event: FloorEvent) {
        match event {
            FloorEvent::Doffer(event) => self.on_doffer_event(event),
            FloorEvent::Sleever(event) => self.on_sleever_event(event),
            FloorEvent::Man(event) => self.on_man_event(event),
            FloorEvent::Winder(event) => match event {
                WinderEvent::AlertReached { winder_id } => self.winder_alert(&winder_id),
                WinderEvent::BobbinsReady { winder_id } => self.bobbins_ready(&winder_id),
                WinderEvent::CutEdgeNeeded { winder_id } => self.bobbins_cut_needed(&winder_id),
                WinderEvent::WindingFailed { winder_id } => self.winder_failed(&winder_id),
            },
            FloorEvent::Spooler(SpoolerEvent::FilledUp { spooler_id }) => self.spooler_filled(&spooler_id),
        }
    }

    fn on_doffer_event(&mut self, event: DofferEvent) {
        match event {
            DofferEvent::Motion { doffer_id, event } => match event {
                MotionEvent::Departed => self.record_activity(&doffer_id, ActivityKind::Idle),
                MotionEvent::Halted => self.record_activity(&doffer_id, ActivityKind::Moving),
                MotionEvent::Moved { delta, .. } => self.doffer_moved(&doffer_id, delta),
                MotionEvent::Arrived { session: Some(session) } => self.doffer_arrived(&session),
                MotionEvent::Arrived { session: None } => {}
            },
            DofferEvent::BobbinsAboard { session: Some(session), .. } => self.bobbins_aboard(&session),
            DofferEvent::BobbinPlaced { session: Some(session), .. } => self.bobbin_placed(&session),
            DofferEvent::TaskCompleted { session: Some(session), .. } => self.task_completed(&session),
            DofferEvent::Activity { doffer_id, kind } => self.record_activity(&doffer_id, kind),
            _ => {}
        }
    }

    fn on_sleever_event(&mut self, event: SleeverEvent) {
        match event {
            SleeverEvent::Motion { sleever_id, event } => match event {
                MotionEvent::Departed => self.record_activity(&sleever_id, ActivityKind::Idle),
                MotionEvent::Halted => self.record_activity(&sleever_id, ActivityKind::Moving),
                MotionEvent::Moved { delta, .. } => self.sleever_moved(&sleever_id, delta),
                MotionEvent::Arrived { session: Some(session) } => self.sleever_arrived(&session),
                MotionEvent::Arrived { session: None } => {}
            },
            SleeverEvent::TaskCompleted { session: Some(session), .. } => self.task_completed(&session),
            SleeverEvent::TaskCompleted { session: None, .. } => {}
            SleeverEvent::Emptied { sleever_id } => self.sleever_empty(&sleever_id),
            SleeverEvent::Activity { sleever_id, kind } => self.record_activity(&sleever_id, kind),
        }
    }

    fn on_man_event(&mut self, event: ManServiceEvent) {
        match event {
            ManServiceEvent::Motion { man_id, event } => match event {
                MotionEvent::Departed => self.record_activity(&man_id, ActivityKind::Idle),
                MotionEvent::Halted => self.record_activity(&man_id, ActivityKind::Moving),
                MotionEvent::Arrived { session: Some(session) } => self.man_reached(&session),
                _ => {}
            },
            ManServiceEvent::TaskCompleted { session: Some(session), .. } => self.task_completed(&session),
            ManServiceEvent::TaskCompleted { session: None, .. } => {}
            ManServiceEvent::Activity { man_id, kind } => self.record_activity(&man_id, kind),
        }
    }

    fn record_activity(&mut self, agent_id: &str, kind: ActivityKind) {
        let now = self.clock.now_ms();
        self.statistics.record(agent_id, kind, now, self.time_coefficient);
    }

    pub(crate) fn push_task(&mut self, session: TaskSession) -> String {
        self.logger.info(&format!(
            "{:?} task for {} on {} created at {} ms",
            session.task_type,
            session.assignee_id,
            session.object_id.as_deref().unwrap_or("-"),
            self.clock.now_ms()
        ));
        self.registry.push(session)
    }

    fn has_open(&self, task_type: TaskType, object_id: &str) -> bool {
        self.registry.find_open(task_type, |t| t.object() == object_id).is_some()
    }

    // ---- arrivals -------------------------------------------------------

    fn man_reached(&mut self, id: &str) {
        let Some(task) = self.open_task(id) else { return };
        let chore = match task.task_type {
            TaskType::StartWinder => Chore::StartWinder,
            TaskType::RotateSpooler => Chore::RotateSpooler,
            TaskType::ChangeSpooler => Chore::ChangeSpooler,
            TaskType::LoadSleever => Chore::LoadSleever,
            TaskType::CutEdgeWinder => Chore::CutEdge,
            _ => return,
        };
        let outcome = match self.men.get_mut(&task.assignee_id) {
            Some(man) => man.perform(Some(id.to_string()), chore),
            None => {
                self.cancel_task(id, "service man not found");
                return;
            }
        };
        if let Err(err) = outcome {
            self.cancel_task(id, &err.to_string());
            return;
        }
        if matches!(chore, Chore::RotateSpooler | Chore::ChangeSpooler) {
            if let Some(spooler) = self.spoolers.get_mut(task.object()) {
                spooler.set_status(SpoolerStatus::Busy);
            }
        }
    }

    pub(crate) fn doffer_arrived(&mut self, id: &str) {
        let Some(task) = self.open_task(id) else { return };
        let Some(status) = self.doffers.get(&task.assignee_id).map(|d| d.status) else {
            self.cancel_task(id, "doffer not found");
            return;
        };

        match status {
            DofferStatus::Ready | DofferStatus::Deliver => {
                let Some((sleever_id, winder_status)) =
                    self.winders.get(task.object()).map(|w| (w.sleever_id.clone(), w.status))
                else {
                    self.cancel_task(id, "winder not found");
                    return;
                };
                if !self.sleevers.contains_key(&sleever_id) {
                    self.cancel_task(id, "sleever not found");
                    return;
                }
                if self.clear_sleever_way(&task, &sleever_id) {
                    return;
                }

                if status == DofferStatus::Ready {
                    if winder_status == WinderStatus::Fail {
                        self.cancel_task(id, "winder failed");
                        return;
                    }
                    if let Some(winder) = self.winders.get_mut(task.object()) {
                        winder.set_status(WinderStatus::Empty);
                    }
                    let outcome = self
                        .doffers
                        .get_mut(&task.assignee_id)
                        .map(|d| d.get_result(Some(id.to_string()), task.places));
                    if let Some(Err(err)) = outcome {
                        self.cancel_task(id, &err.to_string());
                    }
                } else {
                    let cell_known = task
                        .reservations
                        .first()
                        .is_some_and(|r| self.spoolers.contains_key(&r.spooler_id));
                    if !cell_known {
                        self.cancel_task(id, "reserved spooler not found");
                        return;
                    }
                    let outcome = self
                        .doffers
                        .get_mut(&task.assignee_id)
                        .map(|d| d.put_result(Some(id.to_string()), task.places));
                    if let Some(Err(err)) = outcome {
                        self.cancel_task(id, &err.to_string());
                    }
                }
            }
            DofferStatus::WaitWinder => {
                let Some(winder_status) = self.winders.get(task.object()).map(|w| w.status) else {
                    self.cancel_task(id, "winder not found");
                    return;
                };
                if winder_status != WinderStatus::Ready {
                    self.pause_task(id);
                    return;
                }
                self.task_completed(id);
            }
            _ => {}
        }
    }

    /// Make sure the sleever is out of a parked doffer's way. Returns true
    /// when the doffer has to wait.
    fn clear_sleever_way(&mut self, task: &TaskSession, sleever_id: &str) -> bool {
        let margin = self.settings.collision_margin_mm;
        let (Some(doffer), Some(sleever)) = (self.doffers.get(&task.assignee_id), self.sleevers.get(sleever_id)) else {
            return false;
        };
        let (doffer_extent, sleever_extent) = extents(&doffer.body(), &sleever.body(), margin);
        let target = sidestep(&doffer_extent, &sleever_extent, sleever.width, margin);
        let sleever_free = matches!(sleever.status, SleeverStatus::Idle | SleeverStatus::Preparing);
        let sleever_moving = sleever.is_moving();
        let doffer_dest = doffer.destination();

        match target {
            Some(new_x) => {
                if !sleever_moving {
                    if sleever_free || task.is_linked(sleever_id) {
                        if let Some(sleever) = self.sleevers.get_mut(sleever_id) {
                            let (session, y) = (sleever.session(), sleever.y());
                            sleever.reach(session, new_x, y, false);
                        }
                    } else {
                        if let Some(session) = self.registry.get_mut(&task.id) {
                            session.dest_point = Some(doffer_dest);
                        }
                        self.create_collision_task(&task.assignee_id, sleever_id, false, false, false);
                        return true;
                    }
                }
            }
            None if sleever_moving && sleever_free => {}
            None => return false,
        }

        self.pause_task(&task.id);
        if let Some(doffer) = self.doffers.get_mut(&task.assignee_id) {
            doffer.set_status(DofferStatus::Wait);
        }
        true
    }

    fn bobbins_aboard(&mut self, id: &str) {
        let Some(task) = self.open_task(id) else { return };
        if !self.doffers.contains_key(&task.assignee_id) {
            self.cancel_task(id, "doffer not found");
            return;
        }
        if task.places == 0 || task.reservations.len() != task.places as usize {
            self.cancel_task(id, "reservations do not match the load");
            return;
        }
        self.call_sleever(task.object());
        self.send_doffer_to_next_cell(&task);
    }

    fn bobbin_placed(&mut self, id: &str) {
        let Some(task) = self.open_task(id) else { return };
        if !self.doffers.contains_key(&task.assignee_id) {
            self.cancel_task(id, "doffer not found");
            return;
        }
        if task.places == 0 || task.reservations.is_empty() {
            self.cancel_task(id, "no reserved cell left");
            return;
        }

        let placed = task.reservations[0].clone();
        match self.spoolers.get_mut(&placed.spooler_id) {
            Some(spooler) => {
                spooler.putdown(placed.row, placed.column);
            }
            None => {
                self.cancel_task(id, "reserved spooler not found");
                return;
            }
        }
        let Some(task) = self.registry.get_mut(id).map(|t| {
            t.places -= 1;
            t.reservations.remove(0);
            t.clone()
        }) else {
            return;
        };
        if task.reservations.is_empty() {
            self.cancel_task(id, "no reserved cell left");
            return;
        }
        self.send_doffer_to_next_cell(&task);
    }

    fn send_doffer_to_next_cell(&mut self, task: &TaskSession) {
        let Some(x) = task
            .reservations
            .first()
            .and_then(|r| self.spoolers.get(&r.spooler_id).map(|s| s.cell_x(r.column)))
        else {
            self.cancel_task(&task.id, "reserved spooler not found");
            return;
        };
        if let Some(doffer) = self.doffers.get_mut(&task.assignee_id) {
            let y = doffer.y();
            doffer.reach(Some(task.id.clone()), x, y, true);
        }
    }

    fn sleever_arrived(&mut self, id: &str) {
        let Some(task) = self.open_task(id) else { return };
        let Some(status) = self.sleevers.get(&task.assignee_id).map(|s| s.status) else {
            self.cancel_task(id, "sleever not found");
            return;
        };

        match status {
            SleeverStatus::Ready => {
                let Some(doffer_id) = self
                    .winders
                    .get(task.object())
                    .filter(|w| w.status != WinderStatus::Fail)
                    .map(|w| w.doffer_id.clone())
                else {
                    self.cancel_task(id, "winder unavailable");
                    return;
                };
                if self.clear_doffer_way(&task, &doffer_id) {
                    return;
                }
                let outcome = self
                    .sleevers
                    .get_mut(&task.assignee_id)
                    .map(|s| s.put_result(Some(id.to_string()), task.places, task.places >> 1));
                if let Some(Err(err)) = outcome {
                    self.cancel_task(id, &err.to_string());
                }
            }
            SleeverStatus::Empty if task.task_type == TaskType::MoveSleever => {
                self.task_completed(id);
                self.create_load_sleever_task(&task.assignee_id);
            }
            _ => {}
        }
    }

    /// Returns true when the sleever has to wait for its doffer to move.
    fn clear_doffer_way(&mut self, task: &TaskSession, doffer_id: &str) -> bool {
        let margin = self.settings.collision_margin_mm;
        let (Some(sleever), Some(doffer)) = (self.sleevers.get(&task.assignee_id), self.doffers.get(doffer_id)) else {
            return false;
        };
        let (sleever_extent, doffer_extent) = extents(&sleever.body(), &doffer.body(), margin);
        let Some(new_x) = sidestep(&sleever_extent, &doffer_extent, doffer.width, margin) else {
            return false;
        };

        if !doffer.is_moving() && (doffer.status == DofferStatus::Idle || task.is_linked(doffer_id)) {
            let (session, y) = (doffer.session(), doffer.y());
            if let Some(doffer) = self.doffers.get_mut(doffer_id) {
                doffer.reach(session, new_x, y, false);
            }
        }
        self.pause_task(&task.id);
        if let Some(sleever) = self.sleevers.get_mut(&task.assignee_id) {
            sleever.set_status(SleeverStatus::Wait);
        }
        true
    }

    // ---- completion -----------------------------------------------------

    pub(crate) fn task_completed(&mut self, id: &str) {
        let Some(task) = self.open_task(id) else { return };

        match task.task_type {
            TaskType::StartWinder => {
                if let Some(winder) = self.winders.get_mut(task.object()) {
                    winder.set_status(WinderStatus::Loaded);
                    if let Err(err) = winder.start_winding() {
                        self.logger.warn(&err.to_string());
                    }
                }
            }
            TaskType::CutEdgeWinder => {
                let group = self.winders.get_mut(task.object()).map(|winder| {
                    winder.set_status(WinderStatus::Ready);
                    winder.set_cut_edge_mode(false);
                    winder.doffer_id.clone()
                });
                if let Some(doffer_id) = group {
                    self.release_cut_group(&doffer_id);
                }
            }
            TaskType::RotateSpooler | TaskType::ChangeSpooler => {
                if let Some(spooler) = self.spoolers.get_mut(task.object()) {
                    spooler.replace();
                    spooler.set_status(SpoolerStatus::Progress);
                }
                self.move_spooler_to_tail(task.object());
            }
            TaskType::LoadSleever => {
                if let Some(sleever) = self.sleevers.get_mut(task.object()) {
                    sleever.restock();
                }
            }
            TaskType::DeliverBobbins => {
                if let Some(last) = task.reservations.first() {
                    if let Some(spooler) = self.spoolers.get_mut(&last.spooler_id) {
                        spooler.putdown(last.row, last.column);
                    }
                }
                if let Some(session) = self.registry.get_mut(id) {
                    session.reservations.clear();
                }
                self.activate_linked(id, LinkedKind::Sleevers);
            }
            TaskType::DeliverSleeve => {
                if let Some(winder) = self.winders.get_mut(task.object()) {
                    if winder.status != WinderStatus::Fail {
                        winder.set_status(WinderStatus::Loaded);
                    }
                }
                self.activate_linked(id, LinkedKind::Doffers);
            }
            TaskType::MoveDofferSleever => {
                if let Some(doffer) = self.doffers.get_mut(&task.assignee_id) {
                    doffer.set_status(DofferStatus::Idle);
                }
            }
            TaskType::MoveSleever | TaskType::HandleCollision => {}
        }

        self.registry.set_status(id, TaskStatus::Done);
    }

    /// Once no winder of a doffer group still needs an edge cut, every ready
    /// winder of the group gets its bobbins collected.
    fn release_cut_group(&mut self, doffer_id: &str) {
        let group: Vec<String> = self
            .winder_order
            .iter()
            .filter(|id| self.winders.get(*id).is_some_and(|w| w.doffer_id == doffer_id))
            .cloned()
            .collect();
        if group.iter().any(|id| self.winders.get(id).is_some_and(|w| w.cut_edge_mode())) {
            return;
        }
        for winder_id in group {
            if self.winders.get(&winder_id).is_some_and(|w| w.status == WinderStatus::Ready) {
                self.bobbins_ready(&winder_id);
            }
        }
    }

    fn move_spooler_to_tail(&mut self, spooler_id: &str) {
        let Some(doffer_id) = self.spoolers.get(spooler_id).map(|s| s.doffer_id.clone()) else { return };
        self.spooler_order.retain(|id| id != spooler_id);
        let tail = self
            .spooler_order
            .iter()
            .rposition(|id| self.spoolers.get(id).is_some_and(|s| s.doffer_id == doffer_id));
        match tail {
            Some(index) => self.spooler_order.insert(index + 1, spooler_id.to_string()),
            None => self.spooler_order.push(spooler_id.to_string()),
        }
    }

    // ---- task creation --------------------------------------------------

    /// Queue a start for every empty or failed winder that has none yet.
    pub fn start_winders(&mut self) {
        let idle: Vec<String> = self
            .winder_order
            .iter()
            .filter(|id| {
                self.winders
                    .get(*id)
                    .is_some_and(|w| matches!(w.status, WinderStatus::Empty | WinderStatus::Fail))
            })
            .filter(|id| !self.has_open(TaskType::StartWinder, id))
            .cloned()
            .collect();

        for winder_id in idle {
            let Some(man_id) = self.choose_man(ManStrategy::FreeOrLeastBusy, 0) else {
                self.logger.warn("no service man on the floor, winders stay idle");
                return;
            };
            self.push_task(TaskSession::new(TaskType::StartWinder, &man_id, Some(&winder_id), 0));
        }
    }

    pub fn bobbins_ready(&mut self, winder_id: &str) {
        let Some((doffer_id, places)) = self
            .winders
            .get(winder_id)
            .filter(|w| w.status != WinderStatus::Fail)
            .map(|w| (w.doffer_id.clone(), w.places()))
        else {
            return;
        };
        if self.has_open(TaskType::DeliverBobbins, winder_id) {
            return;
        }
        self.push_task(TaskSession::new(TaskType::DeliverBobbins, &doffer_id, Some(winder_id), places));
    }

    pub(crate) fn call_sleever(&mut self, winder_id: &str) {
        let Some((sleever_id, places)) = self
            .winders
            .get(winder_id)
            .filter(|w| w.status != WinderStatus::Fail)
            .map(|w| (w.sleever_id.clone(), w.places()))
        else {
            return;
        };
        if self.has_open(TaskType::DeliverSleeve, winder_id) {
            return;
        }
        self.push_task(TaskSession::new(TaskType::DeliverSleeve, &sleever_id, Some(winder_id), places));
    }

    fn bobbins_cut_needed(&mut self, winder_id: &str) {
        let Some(x) = self
            .winders
            .get(winder_id)
            .filter(|w| w.status == WinderStatus::CutEdge)
            .map(|w| w.x)
        else {
            return;
        };
        if self.has_open(TaskType::CutEdgeWinder, winder_id) {
            return;
        }
        if let Some(man_id) = self.choose_man(ManStrategy::default(), x) {
            self.push_task(TaskSession::new(TaskType::CutEdgeWinder, &man_id, Some(winder_id), 0));
        }
    }

    fn winder_alert(&mut self, winder_id: &str) {
        let Some((doffer_id, places)) = self.winders.get(winder_id).map(|w| (w.doffer_id.clone(), w.places())) else {
            return;
        };
        let doffer_idle = self
            .doffers
            .get(&doffer_id)
            .is_some_and(|d| d.status == DofferStatus::Idle && !d.is_moving());
        if !doffer_idle || self.registry.find_open(TaskType::MoveDofferSleever, |t| t.assignee_id == doffer_id).is_some() {
            return;
        }
        self.push_task(TaskSession::new(TaskType::MoveDofferSleever, &doffer_id, Some(winder_id), places));
    }

    fn winder_failed(&mut self, winder_id: &str) {
        self.logger.warn(&format!("winder {} failed at {} ms", winder_id, self.clock.now_ms()));
        let stale: Vec<String> = self
            .registry
            .iter()
            .filter(|t| {
                t.status == TaskStatus::New
                    && t.object() == winder_id
                    && matches!(t.task_type, TaskType::DeliverBobbins | TaskType::DeliverSleeve)
            })
            .map(|t| t.id.clone())
            .collect();
        for id in stale {
            self.cancel_task(&id, "winder failed");
        }
        self.start_winders();
    }

    fn spooler_filled(&mut self, spooler_id: &str) {
        let Some((x, rotate)) = self.spoolers.get(spooler_id).map(|s| (s.x, s.can_rotate())) else { return };
        let task_type = if rotate { TaskType::RotateSpooler } else { TaskType::ChangeSpooler };
        if self.has_open(task_type, spooler_id) {
            return;
        }
        if let Some(man_id) = self.choose_man(ManStrategy::default(), x) {
            self.push_task(TaskSession::new(task_type, &man_id, Some(spooler_id), 0));
        }
    }

    fn sleever_empty(&mut self, sleever_id: &str) {
        let pending = self
            .registry
            .find_open(TaskType::MoveSleever, |t| t.assignee_id == sleever_id)
            .is_some()
            || self.has_open(TaskType::LoadSleever, sleever_id);
        if pending {
            return;
        }
        self.push_task(TaskSession::new(TaskType::MoveSleever, sleever_id, None, 0));
    }

    pub(crate) fn create_load_sleever_task(&mut self, sleever_id: &str) {
        let Some(x) = self.sleevers.get(sleever_id).map(|s| s.x()) else { return };
        if self.has_open(TaskType::LoadSleever, sleever_id) {
            return;
        }
        if let Some(man_id) = self.choose_man(ManStrategy::default(), x) {
            self.push_task(TaskSession::new(TaskType::LoadSleever, &man_id, Some(sleever_id), 0));
        }
    }
}
