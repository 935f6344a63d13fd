use crate::common::{DomainError, DomainResult};
use crate::domains::doffer::DofferStatus;
use crate::domains::man_service::ManStatus;
use crate::domains::sleever::SleeverStatus;
use crate::domains::spooler::SpoolerStatus;
use crate::domains::tasks::{SpoolerReservation, TaskRunner, TaskSession, TaskStatus, TaskType};

use super::context::Floor;
use super::linking::LinkedKind;

impl Floor {
    /// One scheduler tick: prune finished sessions, then (re)start every NEW
    /// or PAUSED one.
    pub fn run_scheduler(&mut self) {
        for finished in self.registry.prune() {
            for r in &finished.reservations {
                if let Some(spooler) = self.spoolers.get_mut(&r.spooler_id) {
                    spooler.cancel_reservation(r.row, r.column);
                }
            }
        }

        for id in self.registry.startable_ids() {
            let Some(runner) = self
                .registry
                .get(&id)
                .filter(|t| t.status.is_startable())
                .map(|t| t.task_type.runner())
            else {
                continue;
            };
            match runner {
                TaskRunner::ManService => self.run_man_service_task(&id),
                TaskRunner::Doffering => self.run_doffering_task(&id),
                TaskRunner::Sleever => self.run_sleever_task(&id),
                TaskRunner::Collision => self.run_handle_collision(&id),
            }
        }
    }

    pub(crate) fn open_task(&self, id: &str) -> Option<TaskSession> {
        self.registry.get(id).filter(|t| !t.status.is_finished()).cloned()
    }

    pub(crate) fn pause_task(&mut self, id: &str) {
        self.registry.set_status(id, TaskStatus::Paused);
    }

    /// Operator cancellation of an open session.
    pub fn cancel_session(&mut self, id: &str, reason: &str) -> DomainResult<()> {
        if self.open_task(id).is_none() {
            return Err(DomainError::SessionNotFound { id: id.to_string() });
        }
        self.cancel_task(id, reason);
        Ok(())
    }

    /// Cancel a session, release what it holds and return its assignee to
    /// an idle state. Motion already under way is left alone.
    pub(crate) fn cancel_task(&mut self, id: &str, reason: &str) {
        let Some(task) = self.open_task(id) else { return };

        match task.task_type {
            t if t.is_man_task() => {
                if let Some(man) = self.men.get_mut(&task.assignee_id) {
                    man.set_status(ManStatus::Idle);
                }
            }
            TaskType::DeliverBobbins => {
                self.release_reservations(id);
                if let Some(doffer) = self.doffers.get_mut(&task.assignee_id) {
                    doffer.set_status(DofferStatus::Idle);
                    doffer.reset_amount();
                }
                self.activate_linked(id, LinkedKind::Sleevers);
            }
            TaskType::DeliverSleeve => {
                if let Some(sleever) = self.sleevers.get_mut(&task.assignee_id) {
                    sleever.set_status(SleeverStatus::Idle);
                }
                self.activate_linked(id, LinkedKind::Doffers);
            }
            TaskType::MoveDofferSleever => {
                if let Some(doffer) = self.doffers.get_mut(&task.assignee_id) {
                    if doffer.status == DofferStatus::WaitWinder {
                        doffer.set_status(DofferStatus::Idle);
                    }
                }
            }
            _ => {}
        }

        self.release_reservations(id);
        self.registry.set_status(id, TaskStatus::Cancelled);
        self.logger.warn(&format!(
            "{:?} task {} for {} cancelled: {}",
            task.task_type, id, task.assignee_id, reason
        ));
    }

    pub(crate) fn release_reservations(&mut self, id: &str) {
        let reservations = match self.registry.get_mut(id) {
            Some(task) => std::mem::take(&mut task.reservations),
            None => return,
        };
        for r in reservations {
            if let Some(spooler) = self.spoolers.get_mut(&r.spooler_id) {
                spooler.cancel_reservation(r.row, r.column);
            }
        }
    }

    /// Reserve `places` free cells across the doffer's spoolers, in spooler
    /// order. Either every cell is reserved or none is.
    fn reserve_cells(&mut self, id: &str, doffer_id: &str, places: u32) -> bool {
        let wanted = places as usize;
        let mut reserved: Vec<SpoolerReservation> = Vec::new();

        for spooler_id in &self.spooler_order {
            if reserved.len() >= wanted {
                break;
            }
            let Some(spooler) = self.spoolers.get_mut(spooler_id) else { continue };
            if spooler.doffer_id != doffer_id || spooler.status == SpoolerStatus::Busy {
                continue;
            }
            while reserved.len() < wanted {
                let Some((row, column)) = spooler.reserve() else { break };
                reserved.push(SpoolerReservation { spooler_id: spooler_id.clone(), row, column });
            }
        }

        if reserved.len() < wanted {
            for r in &reserved {
                if let Some(spooler) = self.spoolers.get_mut(&r.spooler_id) {
                    spooler.cancel_reservation(r.row, r.column);
                }
            }
            self.logger.info(&format!(
                "{} of {} free cells for doffer {}, delivery {} paused",
                reserved.len(),
                wanted,
                doffer_id,
                id
            ));
            return false;
        }

        if let Some(task) = self.registry.get_mut(id) {
            task.reservations = reserved;
        }
        true
    }

    fn run_man_service_task(&mut self, id: &str) {
        let Some(task) = self.open_task(id) else { return };
        let Some(man_status) = self.men.get(&task.assignee_id).map(|m| m.status) else {
            self.cancel_task(id, "service man not found");
            return;
        };
        if man_status != ManStatus::Idle {
            self.pause_task(id);
            return;
        }

        let target = match task.task_type {
            TaskType::StartWinder | TaskType::CutEdgeWinder => {
                self.winders.get(task.object()).map(|w| (w.x, w.y))
            }
            TaskType::RotateSpooler | TaskType::ChangeSpooler => {
                self.spoolers.get(task.object()).map(|s| (s.x, s.y))
            }
            TaskType::LoadSleever => self.sleevers.get(task.object()).map(|s| (s.x(), s.y())),
            _ => None,
        };
        let Some((x, y)) = target else {
            self.cancel_task(id, "task target not found");
            return;
        };

        self.registry.set_status(id, TaskStatus::Progress);
        let accepted = match self.men.get_mut(&task.assignee_id) {
            Some(man) => {
                man.set_status(ManStatus::Ready);
                man.reach(Some(id.to_string()), x, y)
            }
            None => false,
        };
        if !accepted {
            self.cancel_task(id, "service man cannot move");
        }
    }

    fn run_doffering_task(&mut self, id: &str) {
        let Some(task) = self.open_task(id) else { return };
        let Some((status, moving, amount)) = self
            .doffers
            .get(&task.assignee_id)
            .map(|d| (d.status, d.is_moving(), d.amount()))
        else {
            self.cancel_task(id, "doffer not found");
            return;
        };
        if !self.winders.contains_key(task.object()) {
            self.cancel_task(id, "winder not found");
            return;
        }
        if self.registry.is_linked_anywhere(&task.assignee_id) {
            self.pause_task(id);
            return;
        }

        match task.task_type {
            TaskType::MoveDofferSleever => {
                if status == DofferStatus::WaitWinder && !moving {
                    self.registry.set_status(id, TaskStatus::Progress);
                    self.doffer_arrived(id);
                    return;
                }
                if status != DofferStatus::Idle || moving {
                    self.cancel_task(id, "doffer is already engaged");
                    return;
                }
                self.registry.set_status(id, TaskStatus::Progress);
                self.move_doffer_and_sleever(id, false);
                if let Some(doffer) = self.doffers.get_mut(&task.assignee_id) {
                    doffer.set_status(DofferStatus::WaitWinder);
                }
            }
            TaskType::DeliverBobbins => {
                if status == DofferStatus::Wait {
                    self.registry.set_status(id, TaskStatus::Progress);
                    if let Some(doffer) = self.doffers.get_mut(&task.assignee_id) {
                        doffer.set_status(if amount > 0 { DofferStatus::Deliver } else { DofferStatus::Ready });
                    }
                    self.doffer_arrived(id);
                    return;
                }
                if status != DofferStatus::Idle {
                    self.pause_task(id);
                    return;
                }
                if moving {
                    if let Some(doffer) = self.doffers.get_mut(&task.assignee_id) {
                        doffer.stop_moving(false);
                    }
                    self.pause_task(id);
                    return;
                }

                self.release_reservations(id);
                if !self.reserve_cells(id, &task.assignee_id, task.places) {
                    self.pause_task(id);
                    return;
                }
                self.registry.set_status(id, TaskStatus::Progress);
                if let Some(doffer) = self.doffers.get_mut(&task.assignee_id) {
                    doffer.set_status(DofferStatus::Ready);
                }
                self.move_doffer_and_sleever(id, true);
            }
            _ => {}
        }
    }

    /// Send the doffer to the winder and move its sleever out of the way,
    /// to the side facing away from the spoolers.
    pub(crate) fn move_doffer_and_sleever(&mut self, id: &str, allow_ready: bool) {
        let Some(task) = self.open_task(id) else { return };
        let Some(winder) = self.winders.get(task.object()) else { return };
        let dest = winder.bobbins_point();
        let sleever_id = winder.sleever_id.clone();
        let Some(doffer) = self.doffers.get(&task.assignee_id) else { return };
        let doffer_width = doffer.width;

        let move_doffer = ((allow_ready && doffer.status == DofferStatus::Ready) || doffer.status == DofferStatus::Idle)
            && !doffer.is_moving()
            && !self.registry.is_linked_anywhere(&task.assignee_id);
        let move_sleever = self.sleevers.get(&sleever_id).is_some_and(|s| {
            matches!(s.status, SleeverStatus::Idle | SleeverStatus::Preparing)
                && !s.is_moving()
                && !self.registry.is_linked_anywhere(&sleever_id)
        });
        if !move_doffer {
            return;
        }

        let sleever_x = move_sleever.then(|| self.count_new_sleever_x(&task, &sleever_id, doffer_width, dest.x));
        if let Some(doffer) = self.doffers.get_mut(&task.assignee_id) {
            let y = doffer.y();
            doffer.reach(Some(id.to_string()), dest.x, y, true);
        }
        if let (Some(x), Some(sleever)) = (sleever_x, self.sleevers.get_mut(&sleever_id)) {
            let y = sleever.y();
            sleever.reach(None, x, y, false);
        }
    }

    /// Parking spot for the sleever on the far side of the doffer from its
    /// spooler. Like `sidestep` the result is not clamped to the floor.
    fn count_new_sleever_x(&self, task: &TaskSession, sleever_id: &str, doffer_width: i64, dest_x: i64) -> i64 {
        let Some(sleever) = self.sleevers.get(sleever_id) else { return dest_x };
        let margin = self.settings.collision_margin_mm;

        let offset = match task.reservations.first() {
            Some(r) => self.spoolers.get(&r.spooler_id).map(|s| s.cell_x(r.column)),
            None => self
                .spooler_order
                .iter()
                .filter_map(|id| self.spoolers.get(id))
                .find(|s| s.doffer_id == task.assignee_id)
                .map(|s| s.x),
        };
        let Some(offset) = offset else { return sleever.x() };

        if offset > dest_x {
            dest_x - sleever.width - 2 * margin
        } else {
            dest_x + doffer_width + 2 * margin
        }
    }

    fn run_sleever_task(&mut self, id: &str) {
        let Some(task) = self.open_task(id) else { return };
        let Some((status, moving, x)) = self
            .sleevers
            .get(&task.assignee_id)
            .map(|s| (s.status, s.is_moving(), s.x()))
        else {
            self.cancel_task(id, "sleever not found");
            return;
        };
        if self.registry.is_linked_anywhere(&task.assignee_id) {
            self.pause_task(id);
            return;
        }

        let target = match task.task_type {
            TaskType::DeliverSleeve => {
                let Some(point) = self.winders.get(task.object()).map(|w| w.bobbins_point()) else {
                    self.cancel_task(id, "winder not found");
                    return;
                };
                if !matches!(status, SleeverStatus::Idle | SleeverStatus::Wait) {
                    self.pause_task(id);
                    return;
                }
                point.x
            }
            TaskType::MoveSleever => {
                if status != SleeverStatus::Empty {
                    self.cancel_task(id, "sleever is not empty");
                    return;
                }
                self.nearest_zone(x)
            }
            _ => return,
        };

        if moving {
            if let Some(sleever) = self.sleevers.get_mut(&task.assignee_id) {
                sleever.stop_moving(false);
            }
            self.pause_task(id);
            return;
        }

        self.registry.set_status(id, TaskStatus::Progress);
        let accepted = match self.sleevers.get_mut(&task.assignee_id) {
            Some(sleever) => {
                if task.task_type == TaskType::DeliverSleeve {
                    sleever.set_status(SleeverStatus::Ready);
                }
                let y = sleever.y();
                sleever.reach(Some(id.to_string()), target, y, true)
            }
            None => false,
        };
        if !accepted {
            self.cancel_task(id, "sleever cannot move");
        }
    }

    /// Nearest service zone at or to the right of `x`, else the last one.
    pub(crate) fn nearest_zone(&self, x: i64) -> i64 {
        self.service_zones
            .iter()
            .copied()
            .filter(|zone| *zone >= x)
            .min()
            .or_else(|| self.service_zones.last().copied())
            .unwrap_or(x)
    }

    fn run_handle_collision(&mut self, id: &str) {
        let Some(task) = self.open_task(id) else { return };
        let doffer_id = task.assignee_id.clone();
        let sleever_id = task.object().to_string();
        let (Some(doffer), Some(sleever)) = (self.doffers.get(&doffer_id), self.sleevers.get(&sleever_id)) else {
            self.cancel_task(id, "collision party not found");
            return;
        };
        if doffer.is_moving() || sleever.is_moving() {
            self.pause_task(id);
            return;
        }
        let doffer_session = doffer.session().filter(|s| self.open_task(s).is_some());
        let sleever_session = sleever.session().filter(|s| self.open_task(s).is_some());
        self.registry.set_status(id, TaskStatus::Progress);

        if task.doffer_has_priority() {
            if let Some(owner) = doffer_session {
                self.registry.link(&owner, &sleever_id);
                if task.wait_doffer {
                    self.resume_saved(LinkedKind::Doffers, &doffer_id);
                }
            } else {
                self.resume_saved(LinkedKind::Sleevers, &sleever_id);
            }
        } else if let Some(owner) = sleever_session {
            self.registry.link(&owner, &doffer_id);
            if task.wait_sleever {
                self.resume_saved(LinkedKind::Sleevers, &sleever_id);
            }
        } else {
            self.resume_saved(LinkedKind::Doffers, &doffer_id);
        }

        self.task_completed(id);
    }
}
