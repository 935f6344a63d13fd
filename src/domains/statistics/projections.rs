use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Utilization category an agent spends time in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    Idle,
    Moving,
    Busy,
}

/// A closed interval of one category for one agent, in real-world ms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilizationDelta {
    pub agent_id: String,
    pub kind: ActivityKind,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilizationTotals {
    pub idle_ms: u64,
    pub moving_ms: u64,
    pub busy_ms: u64,
}

impl UtilizationTotals {
    pub fn total_ms(&self) -> u64 {
        self.idle_ms + self.moving_ms + self.busy_ms
    }
}

/// Folds status-category changes into per-agent idle/moving/busy totals.
///
/// Each `record` closes the interval since the agent's previous mark and
/// books it under `kind`, scaled back to real-world time.
#[derive(Debug, Clone, Default)]
pub struct UtilizationProjection {
    marks: BTreeMap<String, u64>,
    totals: BTreeMap<String, UtilizationTotals>,
    pending: Vec<UtilizationDelta>,
}

impl UtilizationProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, agent_id: &str, now_ms: u64) {
        self.marks.insert(agent_id.to_string(), now_ms);
        self.totals.entry(agent_id.to_string()).or_default();
    }

    pub fn record(&mut self, agent_id: &str, kind: ActivityKind, now_ms: u64, scale: u64) {
        let mark = self.marks.insert(agent_id.to_string(), now_ms).unwrap_or(now_ms);
        let duration_ms = now_ms.saturating_sub(mark) * scale.max(1);

        let totals = self.totals.entry(agent_id.to_string()).or_default();
        match kind {
            ActivityKind::Idle => totals.idle_ms += duration_ms,
            ActivityKind::Moving => totals.moving_ms += duration_ms,
            ActivityKind::Busy => totals.busy_ms += duration_ms,
        }

        self.pending.push(UtilizationDelta {
            agent_id: agent_id.to_string(),
            kind,
            duration_ms,
        });
    }

    pub fn totals(&self, agent_id: &str) -> Option<UtilizationTotals> {
        self.totals.get(agent_id).copied()
    }

    pub fn all_totals(&self) -> &BTreeMap<String, UtilizationTotals> {
        &self.totals
    }

    pub fn drain_deltas(&mut self) -> Vec<UtilizationDelta> {
        std::mem::take(&mut self.pending)
    }

    /// Zero every total and restart all intervals at `now_ms`.
    pub fn reset(&mut self, now_ms: u64) {
        for mark in self.marks.values_mut() {
            *mark = now_ms;
        }
        for totals in self.totals.values_mut() {
            *totals = UtilizationTotals::default();
        }
        self.pending.clear();
    }

    pub fn clear(&mut self) {
        self.marks.clear();
        self.totals.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_are_booked_under_the_closing_kind() {
        let mut stats = UtilizationProjection::new();
        stats.register("D_1", 0);
        stats.record("D_1", ActivityKind::Idle, 700, 1);
        stats.record("D_1", ActivityKind::Moving, 2100, 1);
        stats.record("D_1", ActivityKind::Idle, 2100, 1);
        stats.record("D_1", ActivityKind::Busy, 4100, 1);

        let totals = stats.totals("D_1").unwrap();
        assert_eq!(totals.idle_ms, 700);
        assert_eq!(totals.moving_ms, 1400);
        assert_eq!(totals.busy_ms, 2000);
        assert_eq!(totals.total_ms(), 4100);
        assert_eq!(stats.drain_deltas().len(), 4);
        assert!(stats.drain_deltas().is_empty());
    }

    #[test]
    fn scale_restores_real_world_time() {
        let mut stats = UtilizationProjection::new();
        stats.register("M_1", 100);
        stats.record("M_1", ActivityKind::Busy, 600, 4);
        assert_eq!(stats.totals("M_1").unwrap().busy_ms, 2000);

        stats.reset(600);
        assert_eq!(stats.totals("M_1").unwrap().total_ms(), 0);
    }
}
