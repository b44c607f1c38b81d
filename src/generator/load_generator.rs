use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::generator::errors::GeneratorError;
use crate::generator::metrics::{BatchMetrics, MetricsSink, RunSummary};
use crate::generator::pacing::pacing_delay;
use crate::generator::synthetic::SyntheticGenerator;
use crate::storage::TransactionStore;
use crate::types::{BatchSize, TargetRate};

pub const DEFAULT_RUN_DURATION: Duration = Duration::from_secs(15 * 60);

// Achieved rates below this share of the target are reported at the end of a run.
const BEHIND_TARGET_RATIO: f64 = 0.9;

/// Whichever limit is reached first ends the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopCondition {
    pub duration: Option<Duration>,
    pub total_rows: Option<u64>
}

impl StopCondition {
    fn duration_reached(&self, elapsed: Duration) -> bool {
        self.duration.is_some_and(|duration| elapsed >= duration)
    }

    fn rows_remaining(&self, committed: u64) -> Option<u64> {
        self.total_rows.map(|total| total.saturating_sub(committed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadConfig {
    pub rate: TargetRate,
    pub batch_size: BatchSize,
    pub stop: StopCondition
}

impl LoadConfig {
    /// Without any stop condition the run lasts [`DEFAULT_RUN_DURATION`].
    pub fn new(rate: TargetRate, batch_size: BatchSize, duration: Option<Duration>, total_rows: Option<u64>) -> Result<Self, GeneratorError> {
        if duration.is_some_and(|duration| duration.is_zero()) {
            return Err(GeneratorError::InvalidConfig("Run duration must be greater than zero".to_string()));
        }

        if total_rows == Some(0) {
            return Err(GeneratorError::InvalidConfig("Total rows must be at least 1".to_string()));
        }

        let duration = match (duration, total_rows) {
            (None, None) => Some(DEFAULT_RUN_DURATION),
            (duration, _) => duration
        };

        Ok(Self {
            rate,
            batch_size,
            stop: StopCondition { duration, total_rows }
        })
    }
}

/// Inserts synthetic batches at a target rate and reports achieved throughput.
pub struct LoadGenerator<S: TransactionStore + ?Sized, R: Rng = StdRng> {
    store: Arc<S>,
    records: SyntheticGenerator<R>,
    config: LoadConfig,
    summary: RunSummary,
    started: Option<Instant>,
    finished: bool
}

impl<S: TransactionStore + ?Sized, R: Rng> LoadGenerator<S, R> {
    pub fn new(store: Arc<S>, records: SyntheticGenerator<R>, config: LoadConfig) -> Self {
        Self {
            store,
            records,
            config,
            summary: RunSummary::default(),
            started: None,
            finished: false
        }
    }

    /// Work committed so far. Safe to read after `run` was interrupted.
    pub fn progress(&self) -> RunSummary {
        let mut summary = self.summary;

        if let (Some(started), false) = (self.started, self.finished) {
            summary.elapsed = started.elapsed();
        }

        summary
    }

    /// Runs batches until the stop condition is met.
    ///
    /// Each batch is one database transaction. The first failed insert ends
    /// the run; batches committed before it stay committed.
    pub async fn run<W: Write>(&mut self, sink: &mut MetricsSink<W>) -> Result<RunSummary, GeneratorError> {
        let started = Instant::now();
        let batch_size = self.config.batch_size.get();

        self.summary = RunSummary::default();
        self.started = Some(started);
        self.finished = false;

        info!(
            "Generating into [{}] at [{}] with batches of [{batch_size}] rows",
            self.store.table(),
            self.config.rate
        );

        loop {
            if self.config.stop.duration_reached(started.elapsed()) {
                break;
            }

            let rows = match self.config.stop.rows_remaining(self.summary.rows) {
                Some(remaining) => remaining.min(batch_size as u64) as usize,
                None => batch_size
            };

            if rows == 0 {
                break;
            }

            let batch = self.summary.batches + 1;
            let batch_started = Instant::now();
            let records = self.records.batch(rows)?;

            let inserted = self.store.insert_batch(&records).await
                .map_err(|error| GeneratorError::insert(batch, self.summary.rows, error))?;

            self.summary.batches = batch;
            self.summary.rows += inserted;

            let work = batch_started.elapsed();
            let budget = self.config.rate.budget_for(rows);

            if work > budget {
                warn!("Batch [{batch}] took {work:?}, over its {budget:?} budget; falling behind the target rate");
            }

            sleep(pacing_delay(budget, work)).await;

            let metrics = BatchMetrics::new(batch, inserted, work, batch_started.elapsed());
            self.summary.elapsed = started.elapsed();

            info!(
                "Batch [{}] | rows: {} | work: {:.1} ms | elapsed: {:.1} ms | Rows/sec: {:.1} | TPS: {:.2}",
                metrics.batch,
                metrics.rows,
                metrics.work_ms,
                metrics.elapsed_ms,
                metrics.rows_per_sec,
                metrics.tx_per_sec
            );

            sink.record(&metrics)?;
        }

        self.summary.elapsed = started.elapsed();
        self.finished = true;

        info!("{}", self.summary);

        let target = self.config.rate.per_second();
        if self.summary.rows > 0 && self.summary.rows_per_sec() < target * BEHIND_TARGET_RATIO {
            warn!("Achieved {:.1} rows/sec against a target of {target}; the backend could not keep up", self.summary.rows_per_sec());
        }

        Ok(self.summary)
    }
}
