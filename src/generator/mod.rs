mod errors;
mod load_generator;
mod metrics;
mod pacing;
mod synthetic;
#[cfg(test)]
mod tests;

pub use errors::GeneratorError;
pub use load_generator::{LoadConfig, LoadGenerator, DEFAULT_RUN_DURATION};
pub use metrics::{BatchMetrics, MetricsSink, RunSummary};
pub use pacing::pacing_delay;
pub use synthetic::{PromoBias, SyntheticGenerator, DEFAULT_PROMO_WEIGHT};
