use super::{
    pacing_delay, BatchMetrics, GeneratorError, LoadConfig, LoadGenerator, MetricsSink, PromoBias, RunSummary,
    SyntheticGenerator, DEFAULT_RUN_DURATION
};
use crate::models::{Checkpoint, Product, TransactionRecord};
use crate::storage::{ColumnInfo, MemoryStore, StorageError, TransactionStore};
use crate::types::{BatchSize, TableName, TargetRate, TransactionId};

use std::collections::HashSet;
use std::fs;
use std::io::sink;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::sleep;

/// Memory store whose inserts take a fixed amount of (virtual) time.
struct SlowStore {
    inner: MemoryStore,
    delay: Duration
}

#[async_trait]
impl TransactionStore for SlowStore {
    fn table(&self) -> &TableName {
        self.inner.table()
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        self.inner.ensure_schema().await
    }

    async fn describe_columns(&self) -> Result<Vec<ColumnInfo>, StorageError> {
        self.inner.describe_columns().await
    }

    async fn insert_batch(&self, records: &[TransactionRecord]) -> Result<u64, StorageError> {
        sleep(self.delay).await;
        self.inner.insert_batch(records).await
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<TransactionRecord>, StorageError> {
        self.inner.fetch_recent(limit).await
    }

    async fn fetch_since(&self, checkpoint: &Checkpoint, limit: usize) -> Result<Vec<TransactionRecord>, StorageError> {
        self.inner.fetch_since(checkpoint, limit).await
    }

    async fn fetch_by_ids(&self, ids: &[TransactionId]) -> Result<Vec<TransactionRecord>, StorageError> {
        self.inner.fetch_by_ids(ids).await
    }

    async fn count(&self) -> Result<u64, StorageError> {
        self.inner.count().await
    }
}

async fn ready_store() -> Result<Arc<MemoryStore>> {
    let store = MemoryStore::new(TableName::default());
    store.ensure_schema().await?;
    Ok(Arc::new(store))
}

fn config(rate: f64, batch: usize, duration_secs: Option<u64>, total_rows: Option<u64>) -> Result<LoadConfig> {
    Ok(LoadConfig::new(
        TargetRate::new(rate)?,
        BatchSize::new(batch)?,
        duration_secs.map(Duration::from_secs),
        total_rows
    )?)
}

fn metrics_lines(output: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::Reader::from_reader(output);
    let mut lines = Vec::new();

    for record in reader.records() {
        lines.push(record?.iter().map(str::to_string).collect());
    }

    Ok(lines)
}

#[test]
fn test_pacing_never_sleeps_negative() {
    let budget = Duration::from_millis(500);

    assert_eq!(pacing_delay(budget, Duration::from_millis(120)), Duration::from_millis(380));
    assert_eq!(pacing_delay(budget, budget), Duration::ZERO);
    assert_eq!(pacing_delay(budget, Duration::from_secs(2)), Duration::ZERO);
}

#[test]
fn test_load_config_defaults_and_validation() -> Result<()> {
    let defaulted = config(10.0, 10, None, None)?;
    assert_eq!(defaulted.stop.duration, Some(DEFAULT_RUN_DURATION));

    let rows_only = config(10.0, 10, None, Some(100))?;
    assert_eq!(rows_only.stop.duration, None);
    assert_eq!(rows_only.stop.total_rows, Some(100));

    assert!(matches!(config(10.0, 10, Some(0), None), Err(error) if error.to_string().contains("duration")));
    assert!(config(10.0, 10, None, Some(0)).is_err());

    Ok(())
}

#[test]
fn test_batch_metrics_are_consistent() {
    let metrics = BatchMetrics::new(3, 5, Duration::from_millis(120), Duration::from_millis(500));

    assert_eq!(metrics.work_ms, 120.0);
    assert_eq!(metrics.elapsed_ms, 500.0);
    assert_eq!(metrics.rows_per_sec, 10.0);
    assert_eq!(metrics.tx_per_sec, 2.0);

    let instant = BatchMetrics::new(1, 5, Duration::ZERO, Duration::ZERO);
    assert_eq!(instant.rows_per_sec, 0.0);
}

#[test]
fn test_run_summary_display() {
    let summary = RunSummary { batches: 4, rows: 40, elapsed: Duration::from_secs(2) };

    assert_eq!(summary.rows_per_sec(), 20.0);
    assert_eq!(summary.tx_per_sec(), 2.0);
    assert!(summary.to_string().starts_with("Inserted 40 rows via 4 transactions in 2.00 sec"));
}

#[tokio::test(start_paused = true)]
async fn test_five_seconds_at_ten_per_second_in_batches_of_five() -> Result<()> {
    let store = ready_store().await?;
    let mut output = Vec::new();
    let mut generator = LoadGenerator::new(
        store.clone(),
        SyntheticGenerator::seeded(7, PromoBias::default()),
        config(10.0, 5, Some(5), None)?
    );

    let summary = {
        let mut metrics = MetricsSink::new(&mut output);
        generator.run(&mut metrics).await?
    };

    let lines = metrics_lines(&output)?;

    assert!((9..=11).contains(&lines.len()), "metrics lines: {}", lines.len());
    assert!((45..=55).contains(&summary.rows), "rows: {}", summary.rows);
    assert_eq!(store.count().await?, summary.rows);

    for line in &lines {
        let rows_per_sec: f64 = line[4].parse()?;
        assert!(rows_per_sec <= 10.0 + 1e-6, "rows/sec {rows_per_sec} above target");
        assert!(rows_per_sec >= 9.0, "rows/sec {rows_per_sec} far below target");
    }

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_total_rows_truncates_the_final_batch() -> Result<()> {
    let store = ready_store().await?;
    let mut output = Vec::new();
    let mut generator = LoadGenerator::new(store.clone(), SyntheticGenerator::seeded(1, PromoBias::none()), config(1000.0, 5, None, Some(23))?);

    let summary = {
        let mut metrics = MetricsSink::new(&mut output);
        generator.run(&mut metrics).await?
    };

    let rows: Vec<String> = metrics_lines(&output)?.into_iter().map(|line| line[1].clone()).collect();

    assert_eq!(rows, vec!["5", "5", "5", "5", "3"]);
    assert_eq!(summary.batches, 5);
    assert_eq!(summary.rows, 23);
    assert_eq!(store.count().await?, 23);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_failed_batch_halts_and_keeps_committed_batches() -> Result<()> {
    let store = MemoryStore::new(TableName::default()).with_failure_at_batch(3);
    store.ensure_schema().await?;
    let store = Arc::new(store);

    let mut generator = LoadGenerator::new(store.clone(), SyntheticGenerator::seeded(3, PromoBias::none()), config(100.0, 5, None, Some(50))?);
    let result = generator.run(&mut MetricsSink::new(sink())).await;

    assert!(matches!(result, Err(GeneratorError::Insert { batch: 3, committed_rows: 10, .. })));
    assert_eq!(store.count().await?, 10);
    assert_eq!(generator.progress().batches, 2);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_overrun_batches_report_the_achieved_rate() -> Result<()> {
    let inner = MemoryStore::new(TableName::default());
    inner.ensure_schema().await?;
    let store = Arc::new(SlowStore { inner, delay: Duration::from_millis(400) });

    let mut output = Vec::new();
    let mut generator = LoadGenerator::new(store, SyntheticGenerator::seeded(5, PromoBias::none()), config(100.0, 10, None, Some(30))?);

    {
        let mut metrics = MetricsSink::new(&mut output);
        generator.run(&mut metrics).await?;
    }

    for line in metrics_lines(&output)? {
        let work_ms: f64 = line[2].parse()?;
        let rows_per_sec: f64 = line[4].parse()?;

        assert!(work_ms >= 400.0);
        assert!(rows_per_sec <= 25.0 + 1e-6, "reported {rows_per_sec}, expected the achieved rate");
    }

    Ok(())
}

#[tokio::test]
async fn test_metrics_can_be_written_to_a_file() -> Result<()> {
    let store = ready_store().await?;
    let file = tempfile::NamedTempFile::new()?;
    let mut generator = LoadGenerator::new(store, SyntheticGenerator::seeded(9, PromoBias::none()), config(10_000.0, 2, None, Some(4))?);

    generator.run(&mut MetricsSink::new(file.reopen()?)).await?;

    let written = fs::read_to_string(file.path())?;
    let mut lines = written.lines();

    assert_eq!(lines.next(), Some("batch,rows,work_ms,elapsed_ms,rows_per_sec,tx_per_sec"));
    assert_eq!(lines.count(), 2);

    Ok(())
}

#[test]
fn test_synthetic_records_are_unique_and_ordered() -> Result<()> {
    let mut generator = SyntheticGenerator::from_entropy(PromoBias::default());
    let records = generator.batch(500)?;

    let ids: HashSet<_> = records.iter().map(|record| record.transaction_id()).collect();
    assert_eq!(ids.len(), 500);

    assert!(records.windows(2).all(|pair| pair[0].timestamp() <= pair[1].timestamp()));
    assert!(records.iter().all(|record| (1..=5).contains(&record.quantity())));
    assert!(records.iter().all(|record| record.email().contains('@')));

    Ok(())
}

#[test]
fn test_seeded_generators_agree() -> Result<()> {
    let first = SyntheticGenerator::seeded(42, PromoBias::default()).batch(20)?;
    let second = SyntheticGenerator::seeded(42, PromoBias::default()).batch(20)?;

    let describe = |records: &[TransactionRecord]| -> Vec<(TransactionId, String, Product)> {
        records.iter().map(|record| (record.transaction_id(), record.customer_name().to_string(), record.product())).collect()
    };

    assert_eq!(describe(&first), describe(&second));

    Ok(())
}

#[test]
fn test_promo_bias_favours_promoted_products() -> Result<()> {
    let records = SyntheticGenerator::seeded(11, PromoBias::new(vec![Product::Phone], 20)).batch(2_000)?;
    let phones = records.iter().filter(|record| record.product() == Product::Phone).count();

    // 20 of 24 weight units: well above the 20% an unbiased draw would give.
    assert!(phones > 1_400, "phones: {phones}");

    Ok(())
}
