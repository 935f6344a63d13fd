/// Simulated time, advanced in fixed quanta by the floor.
#[derive(Debug, Clone)]
pub struct SimClock {
    now_ms: u64,
    quantum_ms: u64,
}

impl SimClock {
    pub fn new(quantum_ms: u64) -> Self {
        Self { now_ms: 0, quantum_ms: quantum_ms.max(1) }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn quantum_ms(&self) -> u64 {
        self.quantum_ms
    }

    pub fn advance(&mut self) -> u64 {
        self.now_ms += self.quantum_ms;
        self.now_ms
    }

    pub fn reset(&mut self) {
        self.now_ms = 0;
    }
}

/// Fires once every `period_ms` of accumulated simulated time.
#[derive(Debug, Clone)]
pub struct Ticker {
    period_ms: u64,
    accumulated_ms: u64,
}

impl Ticker {
    pub fn new(period_ms: u64) -> Self {
        Self { period_ms: period_ms.max(1), accumulated_ms: 0 }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Adds `dt_ms` and returns how many whole periods elapsed.
    pub fn advance(&mut self, dt_ms: u64) -> u64 {
        self.accumulated_ms += dt_ms;
        let fires = self.accumulated_ms / self.period_ms;
        self.accumulated_ms %= self.period_ms;
        fires
    }

    pub fn reset(&mut self) {
        self.accumulated_ms = 0;
    }
}
