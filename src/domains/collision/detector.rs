use crate::domains::doffer::DofferStatus;
use crate::domains::sleever::SleeverStatus;
use serde::{Deserialize, Serialize};

/// What the detector needs to know about a mobile agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionBody {
    pub x: i64,
    pub width: i64,
    pub moving: bool,
    pub heading_right: bool,
    pub brake_distance: i64,
}

/// Closed interval occupied on the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    pub left: i64,
    pub right: i64,
}

impl Extent {
    pub fn of(body: &CollisionBody, margin: i64) -> Self {
        Self {
            left: body.x - margin,
            right: body.x + body.width + margin - 1,
        }
    }

    pub fn contains(&self, x: i64) -> bool {
        self.left <= x && x <= self.right
    }

    pub fn covers(&self, other: &Extent) -> bool {
        self.left <= other.left && self.right >= other.right
    }

    pub fn overlaps(&self, other: &Extent) -> bool {
        self.left < other.right && self.right > other.left
    }

    fn extend_by_brake(&mut self, body: &CollisionBody) {
        if !body.moving {
            return;
        }
        if body.heading_right {
            self.right += body.brake_distance;
        } else {
            self.left -= body.brake_distance;
        }
    }
}

/// Extents of both agents. A moving agent is stretched by its brake distance
/// unless both travel the same way.
pub fn extents(first: &CollisionBody, second: &CollisionBody, margin: i64) -> (Extent, Extent) {
    let mut a = Extent::of(first, margin);
    let mut b = Extent::of(second, margin);
    if first.moving != second.moving || first.heading_right != second.heading_right {
        a.extend_by_brake(first);
        b.extend_by_brake(second);
    }
    (a, b)
}

/// Lower wins.
pub fn doffer_priority(status: DofferStatus) -> u8 {
    match status {
        DofferStatus::Busy => 0,
        DofferStatus::Deliver => 2,
        _ => 3,
    }
}

/// Lower wins.
pub fn sleever_priority(status: SleeverStatus) -> u8 {
    match status {
        SleeverStatus::Busy => 0,
        SleeverStatus::Ready => 1,
        _ => 4,
    }
}

/// Doffer states that never conflict with a packed sleever.
pub fn doffer_packed(status: DofferStatus) -> bool {
    matches!(
        status,
        DofferStatus::Idle | DofferStatus::Wait | DofferStatus::WaitWinder | DofferStatus::Ready
    )
}

pub fn sleever_packed(status: SleeverStatus) -> bool {
    matches!(
        status,
        SleeverStatus::Idle | SleeverStatus::Preparing | SleeverStatus::Ready | SleeverStatus::Empty
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arbitration {
    Tie,
    DofferWins,
    SleeverWins,
}

pub fn arbitrate(doffer: DofferStatus, sleever: SleeverStatus) -> Arbitration {
    let (dp, sp) = (doffer_priority(doffer), sleever_priority(sleever));
    match dp.cmp(&sp) {
        std::cmp::Ordering::Less => Arbitration::DofferWins,
        std::cmp::Ordering::Greater => Arbitration::SleeverWins,
        std::cmp::Ordering::Equal => Arbitration::Tie,
    }
}

/// Where the `secondary` agent (of `secondary_width`) must go so that it
/// clears `primary`, or None when the two do not conflict.
///
/// The target is not clamped to the floor. Near the first service zone it
/// can be negative, which parks the agent left of the origin.
pub fn sidestep(primary: &Extent, secondary: &Extent, secondary_width: i64, margin: i64) -> Option<i64> {
    if primary.contains(secondary.right) || primary.covers(secondary) {
        Some(primary.left - secondary_width - 2 * margin)
    } else if primary.contains(secondary.left) || secondary.covers(primary) {
        Some(primary.right + 2 * margin)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parked(x: i64, width: i64) -> CollisionBody {
        CollisionBody { x, width, moving: false, heading_right: false, brake_distance: 0 }
    }

    #[test]
    fn extents_include_margin_and_inclusive_right_edge() {
        let (a, b) = extents(&parked(1000, 500), &parked(1580, 200), 80);
        assert_eq!(a, Extent { left: 920, right: 1579 });
        assert_eq!(b, Extent { left: 1500, right: 1859 });
        assert!(a.overlaps(&b));

        let (a, b) = extents(&parked(1000, 500), &parked(1661, 200), 80);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn moving_agent_is_stretched_by_brake_distance() {
        let mover = CollisionBody { x: 0, width: 100, moving: true, heading_right: true, brake_distance: 300 };
        let (a, _) = extents(&mover, &parked(2000, 100), 0);
        assert_eq!(a.right, 99 + 300);

        let same_way = CollisionBody { x: 500, ..mover };
        let (a, b) = extents(&mover, &same_way, 0);
        assert_eq!(a.right, 99);
        assert_eq!(b.right, 599);
    }

    #[test]
    fn busy_doffer_beats_ready_sleever() {
        assert_eq!(arbitrate(DofferStatus::Busy, SleeverStatus::Ready), Arbitration::DofferWins);
        assert_eq!(arbitrate(DofferStatus::Deliver, SleeverStatus::Ready), Arbitration::SleeverWins);
        assert_eq!(arbitrate(DofferStatus::Busy, SleeverStatus::Busy), Arbitration::Tie);
        assert_eq!(arbitrate(DofferStatus::Idle, SleeverStatus::Wait), Arbitration::DofferWins);
    }

    #[test]
    fn sidestep_moves_to_the_clear_side() {
        let margin = 80;
        let doffer = Extent::of(&parked(1000, 500), margin);
        let left_overlap = Extent::of(&parked(800, 300), margin);
        let new_x = sidestep(&doffer, &left_overlap, 300, margin).unwrap();
        assert_eq!(new_x, 920 - 300 - 160);
        assert!(!Extent::of(&parked(new_x, 300), margin).overlaps(&doffer));

        let right_overlap = Extent::of(&parked(1400, 300), margin);
        let new_x = sidestep(&doffer, &right_overlap, 300, margin).unwrap();
        assert_eq!(new_x, 1579 + 160);
        assert!(!Extent::of(&parked(new_x, 300), margin).overlaps(&doffer));

        let clear = Extent::of(&parked(3000, 300), margin);
        assert_eq!(sidestep(&doffer, &clear, 300, margin), None);
    }

    #[test]
    fn sidestep_near_the_origin_parks_left_of_it() {
        let margin = 80;
        let doffer = Extent::of(&parked(0, 1600), margin);
        let sleever = Extent::of(&parked(0, 1600), margin);
        let new_x = sidestep(&doffer, &sleever, 1600, margin).unwrap();
        assert_eq!(new_x, -80 - 1600 - 160);
        assert!(!Extent::of(&parked(new_x, 1600), margin).overlaps(&doffer));
    }
}
