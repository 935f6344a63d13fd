use crate::common::AgentAggregate;
use crate::domains::floor::models::SpoolerModel;
use serde::{Deserialize, Serialize};

use super::events::SpoolerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Free,
    Reserved,
    Occupied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpoolerStatus {
    Ready,
    Progress,
    /// A service man is rotating or changing the unit.
    Busy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellTally {
    pub free: usize,
    pub reserved: usize,
    pub occupied: usize,
}

/// Storage unit with a row x column grid of cells per side. Only the active
/// side accepts bobbins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spooler {
    pub id: String,
    pub doffer_id: String,
    pub rows: usize,
    pub columns: usize,
    pub cell_width: i64,
    pub double_sided: bool,
    pub x: i64,
    pub y: i64,
    pub status: SpoolerStatus,
    active_side: usize,
    sides: [Vec<CellState>; 2],
    pub version: u64,
    #[serde(skip)]
    uncommitted_events: Vec<SpoolerEvent>,
}

impl Spooler {
    pub fn new(model: &SpoolerModel, x: i64, y: i64) -> Self {
        let cells = model.rows * model.columns;
        Self {
            id: model.id.clone(),
            doffer_id: model.doffer_id.clone(),
            rows: model.rows,
            columns: model.columns,
            cell_width: model.cell_width,
            double_sided: model.double_sided,
            x,
            y,
            status: SpoolerStatus::Progress,
            active_side: 0,
            sides: [vec![CellState::Free; cells], vec![CellState::Free; cells]],
            version: 0,
            uncommitted_events: Vec::new(),
        }
    }

    pub fn width(&self) -> i64 {
        self.cell_width * self.columns as i64
    }

    pub fn height(&self) -> i64 {
        self.cell_width * self.rows as i64
    }

    pub fn active_side(&self) -> usize {
        self.active_side
    }

    /// Floor x of the cells in `column`.
    pub fn cell_x(&self, column: usize) -> i64 {
        self.x + column as i64 * self.cell_width
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<CellState> {
        self.index(row, column).map(|i| self.sides[self.active_side][i])
    }

    pub fn set_status(&mut self, status: SpoolerStatus) {
        self.status = status;
    }

    /// Reserve the first free cell of the active side in row-major order.
    pub fn reserve(&mut self) -> Option<(usize, usize)> {
        let cells = &mut self.sides[self.active_side];
        let index = cells.iter().position(|c| *c == CellState::Free)?;
        cells[index] = CellState::Reserved;
        Some((index / self.columns, index % self.columns))
    }

    /// Return a reserved cell to the free pool. Other states are untouched.
    pub fn cancel_reservation(&mut self, row: usize, column: usize) -> bool {
        let Some(index) = self.index(row, column) else { return false };
        let cell = &mut self.sides[self.active_side][index];
        if *cell != CellState::Reserved {
            return false;
        }
        *cell = CellState::Free;
        true
    }

    pub fn putdown(&mut self, row: usize, column: usize) -> bool {
        let Some(index) = self.index(row, column) else { return false };
        self.sides[self.active_side][index] = CellState::Occupied;
        if self.is_filled_up() {
            self.add_event(SpoolerEvent::FilledUp { spooler_id: self.id.clone() });
        }
        true
    }

    pub fn is_filled_up(&self) -> bool {
        !self.sides[self.active_side]
            .iter()
            .any(|c| matches!(c, CellState::Free | CellState::Reserved))
    }

    pub fn can_rotate(&self) -> bool {
        self.double_sided && self.active_side == 0
    }

    /// Turn a double-sided unit to its fresh side, or swap in an empty unit.
    pub fn replace(&mut self) {
        if self.can_rotate() {
            self.active_side += 1;
        } else {
            for side in self.sides.iter_mut() {
                side.iter_mut().for_each(|c| *c = CellState::Free);
            }
            self.active_side = 0;
        }
    }

    pub fn tally(&self) -> CellTally {
        self.sides[self.active_side].iter().fold(CellTally::default(), |mut tally, cell| {
            match cell {
                CellState::Free => tally.free += 1,
                CellState::Reserved => tally.reserved += 1,
                CellState::Occupied => tally.occupied += 1,
            }
            tally
        })
    }

    fn index(&self, row: usize, column: usize) -> Option<usize> {
        (row < self.rows && column < self.columns).then(|| row * self.columns + column)
    }
}

impl AgentAggregate for Spooler {
    type Event = SpoolerEvent;

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

    fn spooler(rows: usize, columns: usize, double_sided: bool) -> Spooler {
        let model = SpoolerModel {
            id: "SP_1".into(),
            doffer_id: "D_1".into(),
            rows,
            columns,
            cell_width: 300,
            double_sided,
        };
        Spooler::new(&model, 1000, 0)
    }

    #[test]
    fn reserves_in_row_major_order() {
        let mut spooler = spooler(2, 2, false);
        assert_eq!(spooler.reserve(), Some((0, 0)));
        assert_eq!(spooler.reserve(), Some((0, 1)));
        assert_eq!(spooler.reserve(), Some((1, 0)));
        assert_eq!(spooler.cell_x(1), 1300);
        assert_eq!(spooler.width(), 600);
    }

    #[test]
    fn cancelling_frees_exactly_that_cell() {
        let mut spooler = spooler(1, 3, false);
        spooler.reserve();
        let (row, col) = spooler.reserve().unwrap();
        assert!(spooler.cancel_reservation(row, col));
        assert_eq!(spooler.cell(0, 1), Some(CellState::Free));
        assert_eq!(spooler.cell(0, 0), Some(CellState::Reserved));
        assert!(!spooler.cancel_reservation(row, col));
        assert_eq!(spooler.reserve(), Some((0, 1)));
    }

    #[test]
    fn cancel_ignores_occupied_cells() {
        let mut spooler = spooler(1, 2, false);
        spooler.reserve();
        assert!(spooler.putdown(0, 0));
        assert!(!spooler.cancel_reservation(0, 0));
        assert_eq!(spooler.cell(0, 0), Some(CellState::Occupied));
        assert!(!spooler.putdown(3, 0));
    }

    #[test]
    fn filled_up_iff_nothing_free_or_reserved() {
        let mut spooler = spooler(1, 2, false);
        spooler.reserve();
        spooler.putdown(0, 0);
        assert!(!spooler.is_filled_up());
        spooler.reserve();
        assert!(!spooler.is_filled_up());
        spooler.putdown(0, 1);
        assert!(spooler.is_filled_up());
        assert_eq!(spooler.take_events().len(), 1);
        assert_eq!(spooler.reserve(), None);
    }

    #[test]
    fn double_sided_rotates_once_then_recreates() {
        let mut spooler = spooler(1, 1, true);
        spooler.reserve();
        spooler.putdown(0, 0);
        assert!(spooler.can_rotate());
        spooler.replace();
        assert_eq!(spooler.active_side(), 1);
        assert_eq!(spooler.tally(), CellTally { free: 1, reserved: 0, occupied: 0 });

        spooler.reserve();
        spooler.putdown(0, 0);
        assert!(!spooler.can_rotate());
        spooler.replace();
        assert_eq!(spooler.active_side(), 0);
        assert_eq!(spooler.cell(0, 0), Some(CellState::Free));
    }

    #[test]
    fn single_sided_is_recreated() {
        let mut spooler = spooler(1, 1, false);
        spooler.reserve();
        spooler.putdown(0, 0);
        assert!(!spooler.can_rotate());
        spooler.replace();
        assert_eq!(spooler.tally().free, 1);
    }
}
