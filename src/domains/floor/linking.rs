use crate::domains::collision::{arbitrate, doffer_packed, extents, sleever_packed, Arbitration};
use crate::domains::tasks::{TaskSession, TaskStatus, TaskType};

use super::context::Floor;

/// Which side of a doffer/sleever pair a linked list refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkedKind {
    Doffers,
    Sleevers,
}

impl Floor {
    /// Release every agent linked into `id` and send each one to the
    /// destination its own running task saved.
    pub(crate) fn activate_linked(&mut self, id: &str, kind: LinkedKind) {
        let linked = match self.registry.get_mut(id) {
            Some(task) => std::mem::take(&mut task.linked),
            None => return,
        };
        for agent_id in linked {
            self.resume_saved(kind, &agent_id);
        }
    }

    /// Send an agent back toward the saved destination of its own task, if
    /// that task is still running.
    pub(crate) fn resume_saved(&mut self, kind: LinkedKind, agent_id: &str) {
        let session = match kind {
            LinkedKind::Doffers => self.doffers.get(agent_id).and_then(|d| d.session()),
            LinkedKind::Sleevers => self.sleevers.get(agent_id).and_then(|s| s.session()),
        };
        let Some(dest) = self
            .registry
            .lookup(session.as_deref())
            .filter(|t| t.status == TaskStatus::Progress)
            .and_then(|t| t.dest_point)
        else {
            return;
        };
        let refused_in_motion = match kind {
            LinkedKind::Doffers => self
                .doffers
                .get_mut(agent_id)
                .is_some_and(|d| !d.reach(session, dest.x, dest.y, true) && d.is_moving()),
            LinkedKind::Sleevers => self
                .sleevers
                .get_mut(agent_id)
                .is_some_and(|s| !s.reach(session, dest.x, dest.y, true) && s.is_moving()),
        };
        // A locator still braking refuses a new destination. A busy agent is
        // left to finish its payload step.
        if refused_in_motion {
            self.deferred_resumes.push((kind, agent_id.to_string()));
        }
    }

    /// Retry resumes refused while the agent was still braking.
    pub(crate) fn retry_deferred_resumes(&mut self) {
        if self.deferred_resumes.is_empty() {
            return;
        }
        let deferred = std::mem::take(&mut self.deferred_resumes);
        for (kind, agent_id) in deferred {
            let moving = match kind {
                LinkedKind::Doffers => self.doffers.get(&agent_id).map(|d| d.is_moving()),
                LinkedKind::Sleevers => self.sleevers.get(&agent_id).map(|s| s.is_moving()),
            };
            match moving {
                Some(true) => self.deferred_resumes.push((kind, agent_id)),
                Some(false) => self.resume_saved(kind, &agent_id),
                None => {}
            }
        }
    }

    pub(crate) fn doffer_moved(&mut self, doffer_id: &str, delta: i64) {
        if delta == 0 {
            return;
        }
        let Some(owner) = self.mover_session(self.doffers.get(doffer_id).and_then(|d| d.session()), doffer_id) else {
            return;
        };

        let sleever_ids: Vec<String> = self.sleevers.keys().cloned().collect();
        for sleever_id in sleever_ids {
            if owner.is_linked(&sleever_id) {
                if let Some(sleever) = self.sleevers.get_mut(&sleever_id) {
                    sleever.shift(delta);
                }
                continue;
            }
            if self.both_packed(doffer_id, &sleever_id) {
                continue;
            }
            self.process_collision(doffer_id, &sleever_id);
        }
    }

    pub(crate) fn sleever_moved(&mut self, sleever_id: &str, delta: i64) {
        if delta == 0 {
            return;
        }
        let Some(owner) = self.mover_session(self.sleevers.get(sleever_id).and_then(|s| s.session()), sleever_id)
        else {
            return;
        };

        let doffer_ids: Vec<String> = self.doffers.keys().cloned().collect();
        for doffer_id in doffer_ids {
            if owner.is_linked(&doffer_id) {
                if let Some(doffer) = self.doffers.get_mut(&doffer_id) {
                    doffer.shift(delta);
                }
                continue;
            }
            if self.both_packed(&doffer_id, sleever_id) {
                continue;
            }
            self.process_collision(&doffer_id, sleever_id);
        }
    }

    /// The task driving a mover, unless the mover is itself held by another
    /// task.
    fn mover_session(&self, session: Option<String>, agent_id: &str) -> Option<TaskSession> {
        let task = self.registry.lookup(session.as_deref())?.clone();
        if self.registry.is_linked_anywhere(agent_id) {
            return None;
        }
        Some(task)
    }

    fn both_packed(&self, doffer_id: &str, sleever_id: &str) -> bool {
        match (self.doffers.get(doffer_id), self.sleevers.get(sleever_id)) {
            (Some(d), Some(s)) => doffer_packed(d.status) && sleever_packed(s.status),
            _ => true,
        }
    }

    fn collision_pending(&self, doffer_id: &str, sleever_id: &str) -> bool {
        self.registry
            .find_open(TaskType::HandleCollision, |t| t.assignee_id == doffer_id && t.object() == sleever_id)
            .is_some()
    }

    /// Check one doffer/sleever pair and, when their extents overlap and one
    /// of them has priority, stop both and open a collision task.
    pub fn process_collision(&mut self, doffer_id: &str, sleever_id: &str) {
        let (Some(doffer), Some(sleever)) = (self.doffers.get(doffer_id), self.sleevers.get(sleever_id)) else {
            return;
        };
        let (doffer_extent, sleever_extent) = extents(&doffer.body(), &sleever.body(), self.settings.collision_margin_mm);
        if !doffer_extent.overlaps(&sleever_extent) {
            return;
        }
        let verdict = arbitrate(doffer.status, sleever.status);
        if verdict == Arbitration::Tie || self.collision_pending(doffer_id, sleever_id) {
            return;
        }

        let doffer_hold = doffer
            .session()
            .filter(|s| self.open_task(s).is_some())
            .map(|s| (s, doffer.destination()));
        let sleever_hold = sleever
            .session()
            .filter(|s| self.open_task(s).is_some())
            .map(|s| (s, sleever.destination()));

        let wait_doffer = doffer_hold.is_some();
        if let Some((session, dest)) = doffer_hold {
            if let Some(task) = self.registry.get_mut(&session) {
                task.dest_point = Some(dest);
            }
            if let Some(doffer) = self.doffers.get_mut(doffer_id) {
                doffer.stop_moving(false);
            }
        }
        let wait_sleever = sleever_hold.is_some();
        if let Some((session, dest)) = sleever_hold {
            if let Some(task) = self.registry.get_mut(&session) {
                task.dest_point = Some(dest);
            }
            if let Some(sleever) = self.sleevers.get_mut(sleever_id) {
                sleever.stop_moving(false);
            }
        }

        self.logger.info(&format!(
            "collision between doffer {} and sleever {} at {} ms, {:?}",
            doffer_id,
            sleever_id,
            self.clock.now_ms(),
            verdict
        ));
        self.create_collision_task(
            doffer_id,
            sleever_id,
            verdict == Arbitration::DofferWins,
            wait_doffer,
            wait_sleever,
        );
    }

    pub(crate) fn create_collision_task(
        &mut self,
        doffer_id: &str,
        sleever_id: &str,
        doffer_wins: bool,
        wait_doffer: bool,
        wait_sleever: bool,
    ) {
        if self.collision_pending(doffer_id, sleever_id) {
            return;
        }
        self.push_task(TaskSession::collision(doffer_id, sleever_id, doffer_wins, wait_doffer, wait_sleever));
    }
}
