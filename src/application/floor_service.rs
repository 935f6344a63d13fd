use crate::common::{ApplicationError, ApplicationResult, SnapshotBatch, SnapshotStore};
use crate::domains::floor::{Floor, FloorModelSource, FloorSettings, FloorView};
use crate::domains::logger::DynLogger;
use crate::domains::statistics::{UtilizationDelta, UtilizationTotals};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Steps between cooperative yields when running flat out.
const YIELD_EVERY_STEPS: u64 = 1_000;

/// Drives a [`Floor`]: loads the models, runs the clock and hands every
/// snapshot batch the floor produces to the store.
pub struct FloorService {
    floor: Floor,
    source: Arc<dyn FloorModelSource>,
    store: Arc<dyn SnapshotStore>,
    logger: DynLogger,
    persisted_batches: u64,
    failed_batches: u64,
}

impl FloorService {
    pub fn new(
        settings: FloorSettings,
        source: Arc<dyn FloorModelSource>,
        store: Arc<dyn SnapshotStore>,
        logger: DynLogger,
    ) -> Self {
        Self {
            floor: Floor::new(settings, logger.clone()),
            source,
            store,
            logger,
            persisted_batches: 0,
            failed_batches: 0,
        }
    }

    pub async fn start(&mut self) -> ApplicationResult<()> {
        let models = self.source.load_models().await.map_err(ApplicationError::ModelSource)?;
        self.floor.start(&models)?;
        info!(
            winders = models.winders.len(),
            doffers = models.doffers.len(),
            sleevers = models.sleevers.len(),
            "floor started"
        );
        Ok(())
    }

    pub async fn stop(&mut self) -> ApplicationResult<()> {
        if !self.floor.is_running() {
            return Ok(());
        }
        self.persist_pending().await;
        self.floor.stop();
        info!(sim_time_ms = self.floor.now_ms(), "floor stopped");
        Ok(())
    }

    pub fn floor(&self) -> &Floor {
        &self.floor
    }

    pub fn floor_mut(&mut self) -> &mut Floor {
        &mut self.floor
    }

    pub fn view(&self) -> FloorView {
        self.floor.view()
    }

    /// Run `duration_ms` of simulated time as fast as possible.
    pub async fn run_for(&mut self, duration_ms: u64) -> ApplicationResult<()> {
        self.ensure_running()?;
        let quantum = self.floor.settings().quantum_ms.max(1);
        let steps = duration_ms.div_ceil(quantum);
        for step in 1..=steps {
            self.floor.step()?;
            self.persist_pending().await;
            if step % YIELD_EVERY_STEPS == 0 {
                tokio::task::yield_now().await;
            }
        }
        debug!(sim_time_ms = self.floor.now_ms(), steps, "run finished");
        Ok(())
    }

    /// Run paced against the wall clock, one quantum per quantum of real
    /// time, for `duration_ms` of simulated time or forever.
    pub async fn run_realtime(&mut self, duration_ms: Option<u64>) -> ApplicationResult<()> {
        self.ensure_running()?;
        let quantum = self.floor.settings().quantum_ms.max(1);
        let mut interval = tokio::time::interval(Duration::from_millis(quantum));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let until = duration_ms.map(|d| self.floor.now_ms() + d);
        loop {
            if until.is_some_and(|t| self.floor.now_ms() >= t) {
                return Ok(());
            }
            interval.tick().await;
            self.floor.step()?;
            self.persist_pending().await;
        }
    }

    /// Hand queued snapshot batches to the store. Failures are logged and
    /// the batch is dropped.
    pub async fn persist_pending(&mut self) {
        for batch in self.floor.take_snapshot_batches() {
            let (batch_id, size) = (batch.batch_id, batch.len());
            match self.store.save_batch(batch).await {
                Ok(()) => self.persisted_batches += 1,
                Err(e) => {
                    self.failed_batches += 1;
                    warn!(%batch_id, size, error = %e, "snapshot batch dropped");
                    self.logger.error(&format!("snapshot batch {} dropped: {}", batch_id, e));
                }
            }
        }
    }

    /// Most recent batch the store holds.
    pub async fn latest_snapshot(&self) -> ApplicationResult<Option<SnapshotBatch>> {
        self.store.latest_batch().await.map_err(ApplicationError::SnapshotStore)
    }

    pub fn drain_utilization(&mut self) -> Vec<UtilizationDelta> {
        self.floor.drain_utilization()
    }

    /// Utilization totals per agent, sorted by agent id.
    pub fn utilization_report(&self) -> Vec<(String, UtilizationTotals)> {
        self.floor
            .utilization()
            .iter()
            .map(|(id, totals)| (id.clone(), *totals))
            .collect()
    }

    pub fn persisted_batches(&self) -> u64 {
        self.persisted_batches
    }

    pub fn failed_batches(&self) -> u64 {
        self.failed_batches
    }

    fn ensure_running(&self) -> ApplicationResult<()> {
        if self.floor.is_running() {
            Ok(())
        } else {
            Err(ApplicationError::NotRunning)
        }
    }
}
