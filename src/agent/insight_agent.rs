use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::agent::analytics::WindowStats;
use crate::agent::errors::AgentError;
use crate::agent::model_client::LanguageModel;
use crate::agent::prompt::PromptBuilder;
use crate::agent::sink::InsightSink;
use crate::models::{Checkpoint, TransactionRecord};
use crate::storage::TransactionStore;

/// Which rows a tick reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// The newest `n` rows, whether or not they were seen before.
    Latest(usize),
    /// Rows after the checkpoint, oldest first, at most `max_rows`. Before the
    /// first read this is the newest `max_rows` rows.
    SinceCheckpoint { max_rows: usize }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub tick: u64,
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    pub window_start: Checkpoint,
    pub window_end: Checkpoint,
    pub truncated: bool,
    pub summary: String
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    NoData,
    Summary(Insight)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    pub interval: Duration,
    pub max_ticks: Option<u64>
}

impl Schedule {
    pub fn new(interval: Duration, max_ticks: Option<u64>) -> Result<Self, AgentError> {
        if interval.is_zero() {
            return Err(AgentError::InvalidSchedule("Tick interval must be greater than zero".to_string()));
        }

        Ok(Self { interval, max_ticks })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentRunStats {
    pub ticks: u64,
    pub summaries: u64,
    pub empty: u64,
    pub model_failures: u64
}

/// Periodically summarizes recent rows with a language model.
pub struct InsightAgent<S: TransactionStore + ?Sized, M: LanguageModel> {
    store: Arc<S>,
    model: M,
    prompts: PromptBuilder,
    checkpoint: Option<Checkpoint>,
    ticks: u64
}

impl<S: TransactionStore + ?Sized, M: LanguageModel> InsightAgent<S, M> {
    pub fn new(store: Arc<S>, model: M, prompts: PromptBuilder) -> Self {
        Self {
            store,
            model,
            prompts,
            checkpoint: None,
            ticks: 0
        }
    }

    pub fn checkpoint(&self) -> Option<Checkpoint> {
        self.checkpoint
    }

    /// One read, summarize, return cycle.
    ///
    /// The checkpoint moves to the newest row as soon as the read succeeds, so
    /// a failed model call does not cause the same rows to be sent again.
    pub async fn tick(&mut self, window: Window) -> Result<TickOutcome, AgentError> {
        self.ticks += 1;

        let records = match (window, self.checkpoint) {
            (Window::Latest(rows), _) | (Window::SinceCheckpoint { max_rows: rows }, None) => {
                self.store.fetch_recent(rows).await?
            }
            (Window::SinceCheckpoint { max_rows }, Some(checkpoint)) => {
                self.store.fetch_since(&checkpoint, max_rows).await?
            }
        };

        let (Some(first), Some(last)) = (records.first(), records.last()) else {
            info!("Tick [{}] found no new rows in [{}]", self.ticks, self.store.table());
            return Ok(TickOutcome::NoData);
        };

        let window_start = first.checkpoint();
        let window_end = last.checkpoint();
        self.checkpoint = Some(window_end);

        let (summary, truncated) = self.summarize(&records).await?;

        Ok(TickOutcome::Summary(Insight {
            tick: self.ticks,
            generated_at: Utc::now(),
            rows: records.len(),
            window_start,
            window_end,
            truncated,
            summary
        }))
    }

    async fn summarize(&self, records: &[TransactionRecord]) -> Result<(String, bool), AgentError> {
        let stats = WindowStats::from_records(records);
        let prompt = self.prompts.build(records, &stats);

        info!(
            "Tick [{}] summarizing [{}] rows ([{}] in prompt)",
            self.ticks,
            records.len(),
            prompt.included_rows
        );

        let text = self.model.complete(&prompt).await?;

        Ok((text, prompt.truncated))
    }

    /// Ticks on `schedule` until `max_ticks` is reached, or forever without one.
    ///
    /// Model failures skip the tick; storage and output failures end the run.
    pub async fn run<W: Write>(&mut self, window: Window, schedule: Schedule, sink: &mut InsightSink<W>) -> Result<AgentRunStats, AgentError> {
        let mut timer = interval(schedule.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut stats = AgentRunStats::default();

        while schedule.max_ticks.is_none_or(|max| stats.ticks < max) {
            timer.tick().await;
            stats.ticks += 1;

            match self.tick(window).await {
                Ok(TickOutcome::NoData) => stats.empty += 1,
                Ok(TickOutcome::Summary(insight)) => {
                    sink.publish(&insight)?;
                    stats.summaries += 1;
                }
                Err(AgentError::Model(failure)) => {
                    warn!("Tick [{}] skipped: {failure}", self.ticks);
                    stats.model_failures += 1;
                }
                Err(failure) => {
                    error!("Insight agent stopped: {failure}");
                    return Err(failure);
                }
            }
        }

        info!(
            "Insight agent finished after [{}] ticks: [{}] summaries, [{}] empty, [{}] model failures",
            stats.ticks,
            stats.summaries,
            stats.empty,
            stats.model_failures
        );

        Ok(stats)
    }
}
