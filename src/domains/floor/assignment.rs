use crate::domains::man_service::ManStatus;
use serde::{Deserialize, Serialize};

use super::context::Floor;

/// How a man is picked for a new man task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ManStrategy {
    FreeOrLeastBusy,
    FreeOrNearest,
    #[default]
    NearestOrLeastBusy,
}

impl Floor {
    /// Pick a man for work at `x_pos`, or None when the floor has no men.
    pub fn choose_man(&self, strategy: ManStrategy, x_pos: i64) -> Option<String> {
        match strategy {
            ManStrategy::FreeOrLeastBusy => self.free_man().or_else(|| self.least_busy_man()),
            ManStrategy::FreeOrNearest => self.free_man().or_else(|| self.nearest_man(x_pos)),
            ManStrategy::NearestOrLeastBusy => self.nearest_man(x_pos).or_else(|| self.least_busy_man()),
        }
    }

    /// First idle, parked man without open work.
    pub(crate) fn free_man(&self) -> Option<String> {
        let counts = self.registry.man_task_counts();
        self.men
            .values()
            .find(|m| m.status == ManStatus::Idle && !m.is_moving() && counts.get(&m.id).copied().unwrap_or(0) == 0)
            .map(|m| m.id.clone())
    }

    /// Parked man whose centre is closest to `x_pos`; ties go to the lower id.
    pub(crate) fn nearest_man(&self, x_pos: i64) -> Option<String> {
        self.men
            .values()
            .filter(|m| !m.is_moving())
            .min_by_key(|m| (m.x() + m.width() / 2 - x_pos).abs())
            .map(|m| m.id.clone())
    }

    /// Man with the fewest open man tasks; ties go to the lower id.
    pub(crate) fn least_busy_man(&self) -> Option<String> {
        let counts = self.registry.man_task_counts();
        self.men
            .keys()
            .min_by_key(|id| counts.get(*id).copied().unwrap_or(0))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::init_noop_logger;
    use crate::domains::floor::{FloorModels, FloorSettings, ManServiceModel};
    use crate::domains::tasks::{TaskSession, TaskType};

    fn man(id: &str) -> ManServiceModel {
        ManServiceModel {
            id: id.into(),
            speed: 60,
            time_start_winder: 1_000,
            time_rotate_spooler: 1_000,
            time_change_spooler: 1_000,
            time_load_sleever: 1_000,
            time_cut_edge: 1_000,
        }
    }

    // Man_1 is centred at 500 and Man_2 at 1700.
    fn floor_with_men(ids: &[&str]) -> Floor {
        let models = FloorModels {
            men: ids.iter().map(|id| man(id)).collect(),
            ..FloorModels::default()
        };
        let settings = FloorSettings { auto_start_winders: false, ..FloorSettings::default() };
        let mut floor = Floor::new(settings, init_noop_logger());
        floor.start(&models).unwrap();
        floor
    }

    fn give_task(floor: &mut Floor, man_id: &str) {
        floor.registry.push(TaskSession::new(TaskType::LoadSleever, man_id, Some("S_1"), 0));
    }

    #[test]
    fn free_man_is_the_first_without_work() {
        let mut floor = floor_with_men(&["Man_1", "Man_2"]);
        assert_eq!(floor.free_man().as_deref(), Some("Man_1"));

        give_task(&mut floor, "Man_1");
        assert_eq!(floor.free_man().as_deref(), Some("Man_2"));
        assert_eq!(floor.least_busy_man().as_deref(), Some("Man_2"));
    }

    #[test]
    fn nearest_man_by_centre() {
        let floor = floor_with_men(&["Man_1", "Man_2"]);
        assert_eq!(floor.nearest_man(2_000).as_deref(), Some("Man_2"));
        assert_eq!(floor.nearest_man(0).as_deref(), Some("Man_1"));
    }

    #[test]
    fn least_busy_ties_go_to_the_lower_id() {
        let mut floor = floor_with_men(&["Man_1", "Man_2"]);
        give_task(&mut floor, "Man_2");
        give_task(&mut floor, "Man_1");

        assert_eq!(floor.choose_man(ManStrategy::FreeOrLeastBusy, 2_000).as_deref(), Some("Man_1"));
        assert_eq!(floor.choose_man(ManStrategy::FreeOrNearest, 2_000).as_deref(), Some("Man_2"));
        assert_eq!(floor.choose_man(ManStrategy::NearestOrLeastBusy, 0).as_deref(), Some("Man_1"));
    }

    #[test]
    fn empty_floor_has_no_man() {
        let floor = floor_with_men(&[]);
        assert!(floor.choose_man(ManStrategy::default(), 0).is_none());
    }
}
