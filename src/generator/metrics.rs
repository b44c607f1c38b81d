use std::fmt;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::time::Duration;

use csv::Writer;
use serde::Serialize;

use crate::types::BatchNumber;

/// One line of generator output.
///
/// `elapsed_ms` spans the whole batch period, pacing sleep included, so
/// `rows / elapsed` is exactly the reported `rows_per_sec`. `tx_per_sec`
/// counts database transactions (one commit per batch).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchMetrics {
    pub batch: BatchNumber,
    pub rows: u64,
    pub work_ms: f64,
    pub elapsed_ms: f64,
    pub rows_per_sec: f64,
    pub tx_per_sec: f64
}

impl BatchMetrics {
    pub fn new(batch: BatchNumber, rows: u64, work: Duration, elapsed: Duration) -> Self {
        Self {
            batch,
            rows,
            work_ms: round(work.as_secs_f64() * 1000.0),
            elapsed_ms: round(elapsed.as_secs_f64() * 1000.0),
            rows_per_sec: round(per_second(rows as f64, elapsed)),
            tx_per_sec: round(per_second(1.0, elapsed))
        }
    }
}

/// Totals for a generator run, complete or interrupted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub batches: u64,
    pub rows: u64,
    pub elapsed: Duration
}

impl RunSummary {
    pub fn rows_per_sec(&self) -> f64 {
        round(per_second(self.rows as f64, self.elapsed))
    }

    pub fn tx_per_sec(&self) -> f64 {
        round(per_second(self.batches as f64, self.elapsed))
    }
}

impl Display for RunSummary {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "Inserted {} rows via {} transactions in {:.2} sec | TPS: {:.1} Rows/sec: {:.0}",
            self.rows,
            self.batches,
            self.elapsed.as_secs_f64(),
            self.tx_per_sec(),
            self.rows_per_sec()
        )
    }
}

/// Writes batch metrics as CSV, flushing after every line so progress is visible live.
pub struct MetricsSink<W: Write> {
    writer: Writer<W>
}

impl<W: Write> MetricsSink<W> {
    pub fn new(output: W) -> Self {
        Self {
            writer: Writer::from_writer(output)
        }
    }

    pub fn record(&mut self, metrics: &BatchMetrics) -> Result<(), csv::Error> {
        self.writer.serialize(metrics)?;
        self.writer.flush()?;
        Ok(())
    }
}

fn per_second(count: f64, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();

    if seconds > 0.0 { count / seconds } else { 0.0 }
}

fn round(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
