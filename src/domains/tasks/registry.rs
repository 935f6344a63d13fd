use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::session::{TaskSession, TaskStatus, TaskType};

/// Every in-flight task session, in creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRegistry {
    sessions: HashMap<String, TaskSession>,
    order: Vec<String>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, session: TaskSession) -> String {
        let id = session.id.clone();
        self.order.push(id.clone());
        self.sessions.insert(id.clone(), session);
        id
    }

    pub fn get(&self, id: &str) -> Option<&TaskSession> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut TaskSession> {
        self.sessions.get_mut(id)
    }

    /// Session for an optional id, as carried by agents.
    pub fn lookup(&self, id: Option<&str>) -> Option<&TaskSession> {
        id.and_then(|id| self.sessions.get(id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskSession> {
        self.order.iter().filter_map(|id| self.sessions.get(id))
    }

    pub fn set_status(&mut self, id: &str, status: TaskStatus) {
        if let Some(session) = self.sessions.get_mut(id) {
            session.status = status;
        }
    }

    /// Drop every DONE or CANCELLED session and return them.
    pub fn prune(&mut self) -> Vec<TaskSession> {
        let finished: Vec<String> = self
            .order
            .iter()
            .filter(|id| self.sessions.get(*id).map_or(true, |s| s.status.is_finished()))
            .cloned()
            .collect();
        self.order.retain(|id| !finished.contains(id));
        finished.iter().filter_map(|id| self.sessions.remove(id)).collect()
    }

    /// Ids of NEW and PAUSED sessions, in creation order.
    pub fn startable_ids(&self) -> Vec<String> {
        self.iter().filter(|s| s.status.is_startable()).map(|s| s.id.clone()).collect()
    }

    /// Whether `agent_id` is held by some running task: linked into it, or
    /// named by a running collision task.
    pub fn is_linked_anywhere(&self, agent_id: &str) -> bool {
        self.iter().filter(|s| s.status.is_active()).any(|s| {
            s.is_linked(agent_id)
                || (s.task_type == TaskType::HandleCollision
                    && (s.assignee_id == agent_id || s.object_id.as_deref() == Some(agent_id)))
        })
    }

    pub fn link(&mut self, id: &str, agent_id: &str) {
        if let Some(session) = self.sessions.get_mut(id) {
            if !session.is_linked(agent_id) {
                session.linked.push(agent_id.to_string());
            }
        }
    }

    /// First unfinished session of `task_type` matching the predicate.
    pub fn find_open<F>(&self, task_type: TaskType, mut predicate: F) -> Option<&TaskSession>
    where
        F: FnMut(&TaskSession) -> bool,
    {
        self.iter()
            .find(|s| s.task_type == task_type && !s.status.is_finished() && predicate(s))
    }

    /// Unfinished man tasks per assignee.
    pub fn man_task_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for session in self.iter().filter(|s| s.task_type.is_man_task() && !s.status.is_finished()) {
            *counts.entry(session.assignee_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn reservation_count(&self) -> usize {
        self.iter().map(|s| s.reservations.len()).sum()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tasks::SpoolerReservation;

    #[test]
    fn prune_removes_only_finished_sessions() {
        let mut registry = TaskRegistry::new();
        let a = registry.push(TaskSession::new(TaskType::StartWinder, "Man_1", Some("W_1"), 0));
        let b = registry.push(TaskSession::new(TaskType::DeliverBobbins, "D_1", Some("W_1"), 2));
        let c = registry.push(TaskSession::new(TaskType::DeliverSleeve, "S_1", Some("W_1"), 2));
        registry.set_status(&a, TaskStatus::Done);
        registry.set_status(&b, TaskStatus::Progress);
        registry.set_status(&c, TaskStatus::Cancelled);

        let removed = registry.prune();
        assert_eq!(removed.len(), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&b).is_some());
        assert!(registry.startable_ids().is_empty());
    }

    #[test]
    fn startable_ids_keep_creation_order() {
        let mut registry = TaskRegistry::new();
        let a = registry.push(TaskSession::new(TaskType::MoveSleever, "S_1", None, 0));
        let b = registry.push(TaskSession::new(TaskType::MoveSleever, "S_2", None, 0));
        registry.set_status(&a, TaskStatus::Paused);
        assert_eq!(registry.startable_ids(), vec![a, b]);
    }

    #[test]
    fn linked_agents_are_held_while_the_task_runs() {
        let mut registry = TaskRegistry::new();
        let owner = registry.push(TaskSession::new(TaskType::DeliverBobbins, "D_1", Some("W_1"), 2));
        registry.link(&owner, "S_1");
        registry.link(&owner, "S_1");
        assert_eq!(registry.get(&owner).unwrap().linked.len(), 1);
        assert!(!registry.is_linked_anywhere("S_1"));

        registry.set_status(&owner, TaskStatus::Progress);
        assert!(registry.is_linked_anywhere("S_1"));
        assert!(!registry.is_linked_anywhere("D_1"));

        let collision = registry.push(TaskSession::collision("D_2", "S_2", true, false, false));
        registry.set_status(&collision, TaskStatus::Paused);
        assert!(registry.is_linked_anywhere("D_2"));
        assert!(registry.is_linked_anywhere("S_2"));
        assert!(registry.get(&collision).unwrap().doffer_has_priority());
    }

    #[test]
    fn counts_open_man_tasks_and_reservations() {
        let mut registry = TaskRegistry::new();
        registry.push(TaskSession::new(TaskType::StartWinder, "Man_1", Some("W_1"), 0));
        let done = registry.push(TaskSession::new(TaskType::CutEdgeWinder, "Man_1", Some("W_2"), 0));
        registry.set_status(&done, TaskStatus::Done);
        let mut delivery = TaskSession::new(TaskType::DeliverBobbins, "D_1", Some("W_1"), 2);
        delivery.reservations.push(SpoolerReservation { spooler_id: "SP_1".into(), row: 0, column: 0 });
        registry.push(delivery);

        assert_eq!(registry.man_task_counts().get("Man_1"), Some(&1));
        assert_eq!(registry.reservation_count(), 1);
        assert!(registry.find_open(TaskType::StartWinder, |s| s.object() == "W_1").is_some());
        assert!(registry.find_open(TaskType::CutEdgeWinder, |_| true).is_none());
    }
}
