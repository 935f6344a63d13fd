use crate::common::{AgentAggregate, DomainError, DomainResult, SimClock, SnapshotBatch, Ticker};
use crate::domains::doffer::{Doffer, DofferEvent};
use crate::domains::kinematics::MotionEvent;
use crate::domains::logger::DynLogger;
use crate::domains::man_service::{ManService, ManServiceEvent};
use crate::domains::sleever::{Sleever, SleeverEvent};
use crate::domains::spooler::{Spooler, SpoolerEvent};
use crate::domains::statistics::{UtilizationDelta, UtilizationProjection, UtilizationTotals};
use crate::domains::tasks::TaskRegistry;
use crate::domains::winder::{Winder, WinderEvent};
use std::collections::BTreeMap;

use super::layout::plan_layout;
use super::linking::LinkedKind;
use super::models::FloorModels;

const MAX_PUMP_ROUNDS: usize = 256;
const MAX_PENDING_BATCHES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorSettings {
    pub quantum_ms: u64,
    pub motion_resolution_ms: u64,
    pub winder_resolution_ms: u64,
    pub scheduler_period_ms: u64,
    pub sync_period_ms: u64,
    pub collision_margin_mm: i64,
    pub auto_start_winders: bool,
}

impl Default for FloorSettings {
    fn default() -> Self {
        Self {
            quantum_ms: 10,
            motion_resolution_ms: 70,
            winder_resolution_ms: 100,
            scheduler_period_ms: 100,
            sync_period_ms: 1000,
            collision_margin_mm: 80,
            auto_start_winders: true,
        }
    }
}

/// An agent event waiting in the floor queue.
#[derive(Debug, Clone)]
pub(crate) enum FloorEvent {
    Doffer(DofferEvent),
    Sleever(SleeverEvent),
    Man(ManServiceEvent),
    Winder(WinderEvent),
    Spooler(SpoolerEvent),
}

impl FloorEvent {
    /// Motion is handled before arrivals and completions.
    fn phase(&self) -> u8 {
        let motion = match self {
            FloorEvent::Doffer(DofferEvent::Motion { event, .. })
            | FloorEvent::Sleever(SleeverEvent::Motion { event, .. })
            | FloorEvent::Man(ManServiceEvent::Motion { event, .. }) => Some(event),
            _ => None,
        };
        match motion {
            Some(MotionEvent::Arrived { .. }) | None => 1,
            Some(_) => 0,
        }
    }
}

/// The simulation context: every agent, the task registry and the clocks.
///
/// Agents and sessions are stored by id and refer to each other only by id,
/// so removing either never leaves a dangling reference.
pub struct Floor {
    pub(crate) settings: FloorSettings,
    pub(crate) logger: DynLogger,
    pub(crate) clock: SimClock,
    motion_ticker: Ticker,
    winder_ticker: Ticker,
    scheduler_ticker: Ticker,
    sync_ticker: Ticker,
    pub(crate) winders: BTreeMap<String, Winder>,
    pub(crate) winder_order: Vec<String>,
    pub(crate) doffers: BTreeMap<String, Doffer>,
    pub(crate) sleevers: BTreeMap<String, Sleever>,
    pub(crate) spoolers: BTreeMap<String, Spooler>,
    pub(crate) spooler_order: Vec<String>,
    pub(crate) men: BTreeMap<String, ManService>,
    pub(crate) service_zones: Vec<i64>,
    pub(crate) registry: TaskRegistry,
    pub(crate) statistics: UtilizationProjection,
    pub(crate) time_coefficient: u64,
    pub(crate) deferred_resumes: Vec<(LinkedKind, String)>,
    pending_batches: Vec<SnapshotBatch>,
    running: bool,
}

impl Floor {
    pub fn new(settings: FloorSettings, logger: DynLogger) -> Self {
        Self {
            clock: SimClock::new(settings.quantum_ms),
            motion_ticker: Ticker::new(settings.motion_resolution_ms),
            winder_ticker: Ticker::new(settings.winder_resolution_ms),
            scheduler_ticker: Ticker::new(settings.scheduler_period_ms),
            sync_ticker: Ticker::new(settings.sync_period_ms),
            settings,
            logger,
            winders: BTreeMap::new(),
            winder_order: Vec::new(),
            doffers: BTreeMap::new(),
            sleevers: BTreeMap::new(),
            spoolers: BTreeMap::new(),
            spooler_order: Vec::new(),
            men: BTreeMap::new(),
            service_zones: Vec::new(),
            registry: TaskRegistry::new(),
            statistics: UtilizationProjection::new(),
            time_coefficient: 1,
            deferred_resumes: Vec::new(),
            pending_batches: Vec::new(),
            running: false,
        }
    }

    /// Build every agent from `models` and begin running.
    pub fn start(&mut self, models: &FloorModels) -> DomainResult<()> {
        models.validate()?;
        if self.running {
            self.stop();
        }

        let scaled = models.scaled();
        let layout = plan_layout(&scaled);
        let lanes = layout.lanes;

        for model in &scaled.winders {
            let x = layout.winder_x.get(&model.id).copied().unwrap_or(0);
            self.winders.insert(model.id.clone(), Winder::new(model, x, lanes.winder));
            self.winder_order.push(model.id.clone());
        }
        for model in &scaled.doffers {
            let x = layout.doffer_x.get(&model.id).copied().unwrap_or(0);
            self.doffers.insert(model.id.clone(), Doffer::new(model, x, lanes.doffer));
        }
        for model in &scaled.sleevers {
            let x = layout.sleever_x.get(&model.id).copied().unwrap_or(0);
            self.sleevers.insert(model.id.clone(), Sleever::new(model, x, lanes.sleever));
        }
        for model in &scaled.spoolers {
            let x = layout.spooler_x.get(&model.id).copied().unwrap_or(0);
            self.spoolers.insert(model.id.clone(), Spooler::new(model, x, lanes.spooler));
            self.spooler_order.push(model.id.clone());
        }
        for model in &scaled.men {
            let x = layout.man_x.get(&model.id).copied().unwrap_or(0);
            self.men.insert(model.id.clone(), ManService::new(model, x, lanes.man));
        }
        self.service_zones = layout.service_zones;
        self.time_coefficient = models.settings.coefficient();

        self.clock.reset();
        for ticker in [
            &mut self.motion_ticker,
            &mut self.winder_ticker,
            &mut self.scheduler_ticker,
            &mut self.sync_ticker,
        ] {
            ticker.reset();
        }
        self.registry.clear();
        self.statistics.clear();
        let mobile: Vec<String> = self
            .doffers
            .keys()
            .chain(self.sleevers.keys())
            .chain(self.men.keys())
            .cloned()
            .collect();
        for id in &mobile {
            self.statistics.register(id, 0);
        }

        self.running = true;
        self.logger.info(&format!(
            "floor started: {} winders, {} doffers, {} sleevers, {} spoolers, {} men, time coefficient {}",
            self.winders.len(),
            self.doffers.len(),
            self.sleevers.len(),
            self.spoolers.len(),
            self.men.len(),
            self.time_coefficient
        ));

        if self.settings.auto_start_winders {
            self.start_winders();
            self.pump_events();
        }
        Ok(())
    }

    /// Halt the clocks and drop every agent, session and reservation.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        let released = self.registry.len();
        self.running = false;
        self.registry.clear();
        self.winders.clear();
        self.winder_order.clear();
        self.doffers.clear();
        self.sleevers.clear();
        self.spoolers.clear();
        self.spooler_order.clear();
        self.men.clear();
        self.service_zones.clear();
        self.pending_batches.clear();
        self.deferred_resumes.clear();
        self.logger.info(&format!(
            "floor stopped at {} ms, {} task sessions released",
            self.clock.now_ms(),
            released
        ));
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn settings(&self) -> &FloorSettings {
        &self.settings
    }

    /// Advance the floor by one clock quantum.
    pub fn step(&mut self) -> DomainResult<()> {
        if !self.running {
            return Err(DomainError::InvalidCommand {
                reason: "floor is not running".to_string(),
            });
        }
        let dt = self.clock.quantum_ms();
        self.clock.advance();

        let motion_step = self.motion_ticker.period_ms();
        for _ in 0..self.motion_ticker.advance(dt) {
            for doffer in self.doffers.values_mut() {
                doffer.tick(motion_step);
            }
            for sleever in self.sleevers.values_mut() {
                sleever.tick(motion_step);
            }
            for man in self.men.values_mut() {
                man.tick(motion_step);
            }
            self.pump_events();
            self.retry_deferred_resumes();
            self.pump_events();
        }

        let winder_step = self.winder_ticker.period_ms();
        for _ in 0..self.winder_ticker.advance(dt) {
            for winder in self.winders.values_mut() {
                winder.tick(winder_step);
            }
            self.pump_events();
        }

        if self.scheduler_ticker.advance(dt) > 0 {
            self.run_scheduler();
            self.pump_events();
        }

        if self.sync_ticker.advance(dt) > 0 {
            let batch = self.snapshot_batch()?;
            if self.pending_batches.len() >= MAX_PENDING_BATCHES {
                self.pending_batches.remove(0);
            }
            self.pending_batches.push(batch);
        }
        Ok(())
    }

    /// Step until at least `duration_ms` of simulated time has passed.
    pub fn advance(&mut self, duration_ms: u64) -> DomainResult<()> {
        let quantum = self.clock.quantum_ms();
        let steps = (duration_ms + quantum - 1) / quantum;
        for _ in 0..steps {
            self.step()?;
        }
        Ok(())
    }

    /// Route queued agent events until none are left. Within a round motion
    /// is handled before arrivals and completions.
    pub fn pump_events(&mut self) {
        for _ in 0..MAX_PUMP_ROUNDS {
            let mut events = self.collect_events();
            if events.is_empty() {
                return;
            }
            events.sort_by_key(FloorEvent::phase);
            for event in events {
                self.handle_event(event);
            }
        }
        self.logger.warn(&format!(
            "event queue did not settle after {} rounds at {} ms",
            MAX_PUMP_ROUNDS,
            self.clock.now_ms()
        ));
    }

    fn collect_events(&mut self) -> Vec<FloorEvent> {
        let mut events = Vec::new();
        for doffer in self.doffers.values_mut() {
            events.extend(doffer.take_events().into_iter().map(FloorEvent::Doffer));
        }
        for sleever in self.sleevers.values_mut() {
            events.extend(sleever.take_events().into_iter().map(FloorEvent::Sleever));
        }
        for man in self.men.values_mut() {
            events.extend(man.take_events().into_iter().map(FloorEvent::Man));
        }
        for winder in self.winders.values_mut() {
            events.extend(winder.take_events().into_iter().map(FloorEvent::Winder));
        }
        for spooler in self.spoolers.values_mut() {
            events.extend(spooler.take_events().into_iter().map(FloorEvent::Spooler));
        }
        events
    }

    pub fn take_snapshot_batches(&mut self) -> Vec<SnapshotBatch> {
        std::mem::take(&mut self.pending_batches)
    }

    pub fn drain_utilization(&mut self) -> Vec<UtilizationDelta> {
        self.statistics.drain_deltas()
    }

    pub fn utilization(&self) -> &BTreeMap<String, UtilizationTotals> {
        self.statistics.all_totals()
    }

    pub fn reset_statistics(&mut self) {
        self.statistics.reset(self.clock.now_ms());
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn service_zones(&self) -> &[i64] {
        &self.service_zones
    }

    pub fn winder_order(&self) -> &[String] {
        &self.winder_order
    }

    pub fn spooler_order(&self) -> &[String] {
        &self.spooler_order
    }

    pub fn winder(&self, id: &str) -> Option<&Winder> {
        self.winders.get(id)
    }

    pub fn winder_mut(&mut self, id: &str) -> Option<&mut Winder> {
        self.winders.get_mut(id)
    }

    pub fn doffer(&self, id: &str) -> Option<&Doffer> {
        self.doffers.get(id)
    }

    pub fn doffer_mut(&mut self, id: &str) -> Option<&mut Doffer> {
        self.doffers.get_mut(id)
    }

    pub fn sleever(&self, id: &str) -> Option<&Sleever> {
        self.sleevers.get(id)
    }

    pub fn sleever_mut(&mut self, id: &str) -> Option<&mut Sleever> {
        self.sleevers.get_mut(id)
    }

    pub fn spooler(&self, id: &str) -> Option<&Spooler> {
        self.spoolers.get(id)
    }

    pub fn spooler_mut(&mut self, id: &str) -> Option<&mut Spooler> {
        self.spoolers.get_mut(id)
    }

    pub fn man(&self, id: &str) -> Option<&ManService> {
        self.men.get(id)
    }

    pub fn man_mut(&mut self, id: &str) -> Option<&mut ManService> {
        self.men.get_mut(id)
    }
}
