use serde::{Deserialize, Serialize};

use super::events::MotionEvent;

/// A point on the floor in millimetres. Agents travel along x; y is the lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionPhase {
    None,
    Starting,
    Moving,
    Braking,
}

/// Time in milliseconds needed to cover `distance` from rest with constant
/// `acceleration` (mm/s²), rounded up to the next whole millisecond.
pub fn quadratic_time(distance: i64, acceleration: i64) -> u64 {
    if distance <= 0 || acceleration <= 0 {
        return 0;
    }
    let t = 1000.0 * (2.0 * distance as f64 / acceleration as f64).sqrt();
    (t - 1e-6).ceil().max(0.0) as u64
}

/// One-dimensional motion profile shared by every mobile agent.
///
/// With a positive acceleration a trip runs through STARTING (quadratic
/// ramp up), MOVING (cruise at `max_speed`) and BRAKING (quadratic ramp
/// down). With zero acceleration the trip is a single constant-speed MOVING
/// phase and `stop_moving` halts on the spot.
///
/// Positions are recomputed from the phase start on every tick, so rounding
/// never accumulates and the trip always ends exactly on the destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Locator {
    x: i64,
    y: i64,
    start_x: i64,
    middle_x: i64,
    dest: Point,
    max_speed: i64,
    acceleration: i64,
    speed: i64,
    extra_width: i64,
    phase: MotionPhase,
    time_left: u64,
    time_reach: u64,
    session: Option<String>,
    notify: bool,
    #[serde(skip)]
    events: Vec<MotionEvent>,
}

impl Locator {
    pub fn new(x: i64, y: i64, max_speed: i64, acceleration: i64) -> Self {
        let extra_width = if acceleration > 0 {
            max_speed * max_speed / (2 * acceleration)
        } else {
            0
        };
        Self {
            x,
            y,
            start_x: x,
            middle_x: x,
            dest: Point::new(x, y),
            max_speed,
            acceleration,
            speed: 0,
            extra_width,
            phase: MotionPhase::None,
            time_left: 0,
            time_reach: 0,
            session: None,
            notify: true,
            events: Vec::new(),
        }
    }

    pub fn x(&self) -> i64 {
        self.x
    }

    pub fn y(&self) -> i64 {
        self.y
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn destination(&self) -> Point {
        self.dest
    }

    pub fn speed(&self) -> i64 {
        self.speed
    }

    pub fn max_speed(&self) -> i64 {
        self.max_speed
    }

    pub fn acceleration(&self) -> i64 {
        self.acceleration
    }

    /// Distance covered while accelerating from rest to `max_speed`.
    pub fn extra_width(&self) -> i64 {
        self.extra_width
    }

    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    pub fn is_moving(&self) -> bool {
        self.phase != MotionPhase::None
    }

    pub fn heading_right(&self) -> bool {
        self.is_moving() && self.dest.x > self.x
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn phase_duration_ms(&self) -> u64 {
        self.time_reach
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn set_session(&mut self, session: Option<String>) {
        self.session = session;
    }

    pub fn notifies(&self) -> bool {
        self.notify
    }

    /// Distance still needed to come to rest from the current speed.
    pub fn brake_distance(&self) -> i64 {
        if self.acceleration <= 0 || !self.is_moving() {
            return 0;
        }
        self.speed * self.speed / (2 * self.acceleration)
    }

    /// Begin (or retarget) a trip to `x`. Returns false when the request is
    /// ignored: a locator without speed, or one already heading elsewhere.
    pub fn reach(&mut self, session: Option<String>, x: i64, y: i64, notify: bool) -> bool {
        if self.max_speed <= 0 {
            return false;
        }

        if self.is_moving() {
            if x == self.dest.x {
                self.dest.y = y;
                self.session = session;
                self.notify = notify;
                return true;
            }
            return false;
        }

        self.session = session;
        self.notify = notify;
        self.dest = Point::new(x, y);
        self.speed = 0;

        if self.x == x {
            if notify {
                self.events.push(MotionEvent::Arrived { session: self.session.clone() });
            }
            return true;
        }

        self.events.push(MotionEvent::Departed);
        self.start_x = self.x;
        if self.acceleration > 0 {
            self.begin_phase(MotionPhase::Starting);
        } else {
            self.begin_phase(MotionPhase::Moving);
        }
        true
    }

    /// Replace the rest of the trip with a brake-only phase from the current
    /// speed. Constant-speed locators halt immediately.
    pub fn stop_moving(&mut self, notify: bool) {
        self.notify = notify;
        if !self.is_moving() || self.phase == MotionPhase::Braking {
            return;
        }

        if self.acceleration <= 0 {
            self.dest.x = self.x;
            self.finish();
            return;
        }

        let brake = self.brake_distance();
        self.dest.x = if self.dest.x > self.start_x { self.x + brake } else { self.x - brake };
        self.start_x = self.x;
        self.middle_x = self.x;
        self.phase = MotionPhase::Braking;
        self.time_reach = quadratic_time(brake, self.acceleration);
        self.time_left = self.time_reach;
    }

    /// Drop the current trip without braking or arrival.
    pub fn abort(&mut self) {
        if !self.is_moving() {
            return;
        }
        self.phase = MotionPhase::None;
        self.speed = 0;
        self.time_left = 0;
        self.time_reach = 0;
        self.dest.x = self.x;
        self.events.push(MotionEvent::Halted);
    }

    /// Move the whole trip by `delta` without emitting motion events.
    pub fn shift(&mut self, delta: i64) {
        self.x += delta;
        self.start_x += delta;
        self.middle_x += delta;
        self.dest.x += delta;
    }

    /// Advance the profile by `step_ms`.
    pub fn tick(&mut self, step_ms: u64) {
        if !self.is_moving() {
            return;
        }

        self.time_left = self.time_left.saturating_sub(step_ms);
        let offset = self.offset_at(self.time_left);
        self.speed = self.speed_at(self.time_left);

        let previous_x = self.x;
        self.x = if self.dest.x > self.start_x {
            self.middle_x + offset
        } else {
            self.middle_x - offset
        };
        if self.x != previous_x {
            self.events.push(MotionEvent::Moved { x: self.x, delta: self.x - previous_x });
        }

        if self.time_left == 0 {
            match self.phase {
                MotionPhase::Starting => self.begin_phase(MotionPhase::Moving),
                MotionPhase::Moving if self.acceleration > 0 => self.begin_phase(MotionPhase::Braking),
                _ => self.finish(),
            }
        }
    }

    pub fn take_events(&mut self) -> Vec<MotionEvent> {
        std::mem::take(&mut self.events)
    }

    fn begin_phase(&mut self, phase: MotionPhase) {
        self.middle_x = self.x;
        let distance = (self.dest.x - self.start_x).abs();
        let ramp = if distance > 2 * self.extra_width { self.extra_width } else { distance / 2 };

        let duration = match phase {
            MotionPhase::Starting => {
                self.speed = 0;
                quadratic_time(ramp, self.acceleration)
            }
            MotionPhase::Moving => {
                let cruise = if self.acceleration <= 0 {
                    distance
                } else if distance > 2 * self.extra_width {
                    distance - 2 * self.extra_width
                } else {
                    0
                };
                let t = (cruise * 1000 / self.max_speed.max(1)) as u64;
                if t == 0 && self.acceleration > 0 {
                    self.begin_phase(MotionPhase::Braking);
                    return;
                }
                self.speed = self.max_speed;
                t
            }
            MotionPhase::Braking => quadratic_time(ramp, self.acceleration),
            MotionPhase::None => 0,
        };

        self.phase = phase;
        self.time_reach = duration;
        self.time_left = duration;
    }

    fn finish(&mut self) {
        if self.x != self.dest.x {
            let previous_x = self.x;
            self.x = self.dest.x;
            self.events.push(MotionEvent::Moved { x: self.x, delta: self.x - previous_x });
        }
        self.phase = MotionPhase::None;
        self.speed = 0;
        self.time_left = 0;
        self.time_reach = 0;
        self.events.push(MotionEvent::Halted);
        if self.notify {
            self.events.push(MotionEvent::Arrived { session: self.session.clone() });
        }
    }

    /// Offset from `middle_x` after the phase has `left` ms to run.
    fn offset_at(&self, left: u64) -> i64 {
        let elapsed = self.time_reach.saturating_sub(left) as i64;
        match self.phase {
            MotionPhase::Starting => (self.acceleration * elapsed * elapsed / 1_000_000) >> 1,
            MotionPhase::Moving => elapsed * self.max_speed / 1000,
            MotionPhase::Braking => {
                let left = left as i64;
                let remaining = (self.acceleration * left * left / 1_000_000) >> 1;
                ((self.dest.x - self.middle_x).abs() - remaining).max(0)
            }
            MotionPhase::None => 0,
        }
    }

    fn speed_at(&self, left: u64) -> i64 {
        match self.phase {
            MotionPhase::Starting => {
                let elapsed = self.time_reach.saturating_sub(left) as i64;
                (self.acceleration * elapsed / 1000).min(self.max_speed)
            }
            MotionPhase::Moving => self.max_speed,
            MotionPhase::Braking => self.speed.min(self.acceleration * left as i64 / 1000),
            MotionPhase::None => 0,
        }
    }
}
