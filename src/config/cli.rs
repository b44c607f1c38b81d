use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::agent::{DEFAULT_MAX_PROMPT_CHARS, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_MODEL_TIMEOUT};
use crate::provisioner::{DEFAULT_CAPACITY, DEFAULT_DATABASE, DEFAULT_PORT};
use crate::types::{BatchSize, InstanceName, TableName, TargetRate};

#[derive(Parser, Debug)]
#[command(name = "lakebase-demo", version, about = "Provision a managed PostgreSQL instance, load it with synthetic sales and summarize them with an LLM")]
pub struct Cli {
    /// error, warn, info, debug or trace
    #[arg(long, global = true, env = "LAKEBASE_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create (or find) the database instance and wait until it is available
    Provision(ProvisionArgs),
    /// Create the transactions table if needed and verify read/write access
    Check(CheckArgs),
    /// Insert synthetic transactions at a target rate
    Generate(GenerateArgs),
    /// Periodically summarize recent transactions with a language model
    Insights(InsightsArgs),
    /// Run check, generate and one insight tick in a single process
    Demo(DemoArgs)
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory
}

#[derive(Args, Debug, Clone)]
pub struct WorkspaceArgs {
    #[arg(long, env = "DATABRICKS_HOST")]
    pub workspace_host: Option<String>,

    #[arg(long, env = "DATABRICKS_TOKEN", hide_env_values = true)]
    pub workspace_token: Option<String>,

    #[arg(long, env = "LAKEBASE_INSTANCE", default_value = "my-lakebase")]
    pub instance: InstanceName
}

#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    #[arg(long, value_enum, default_value_t = StoreKind::Postgres)]
    pub store: StoreKind,

    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    #[arg(long, env = "PGDATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Connect directly instead of asking the workspace for credentials
    #[arg(long, env = "PGHOST")]
    pub pg_host: Option<String>,

    #[arg(long, env = "PGPORT", default_value_t = DEFAULT_PORT)]
    pub pg_port: u16,

    #[arg(long, env = "PGUSER")]
    pub pg_user: Option<String>,

    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    pub pg_password: Option<String>,

    #[arg(long, env = "LAKEBASE_TABLE", default_value = "public.transactions")]
    pub table: TableName
}

#[derive(Args, Debug, Clone)]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    #[arg(long, default_value = DEFAULT_CAPACITY)]
    pub capacity: String,

    /// Create the instance when it does not exist
    #[arg(long)]
    pub create: bool,

    #[arg(long, default_value_t = 600)]
    pub wait_secs: u64,

    /// Also register a catalog with this name for the instance
    #[arg(long)]
    pub catalog: Option<String>,

    #[arg(long, env = "PGDATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Only ensure the schema; do not write probe rows
    #[arg(long)]
    pub skip_probe: bool
}

#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Target records per second
    #[arg(long, default_value = "10")]
    pub rate: TargetRate,

    #[arg(long, default_value = "10")]
    pub batch_size: BatchSize,

    #[arg(long)]
    pub duration_secs: Option<u64>,

    #[arg(long)]
    pub total_rows: Option<u64>,

    /// Seed for a reproducible record stream
    #[arg(long)]
    pub seed: Option<u64>,

    /// Comma separated products to favour, or "none"
    #[arg(long, default_value = "Phone,Laptop")]
    pub promo: String,

    #[arg(long, default_value_t = crate::generator::DEFAULT_PROMO_WEIGHT)]
    pub promo_weight: u32,

    /// Write metrics CSV here instead of stdout
    #[arg(long)]
    pub metrics_out: Option<PathBuf>
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub load: LoadArgs
}

#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Defaults to <workspace host>/serving-endpoints
    #[arg(long, env = "LAKEBASE_MODEL_ENDPOINT")]
    pub model_endpoint: Option<String>,

    #[arg(long, env = "LAKEBASE_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long, default_value_t = DEFAULT_MODEL_TIMEOUT.as_secs())]
    pub model_timeout_secs: u64
}

#[derive(Args, Debug, Clone)]
pub struct AgentArgs {
    #[arg(long, default_value_t = 50)]
    pub window_rows: usize,

    /// Always read the newest rows instead of the rows since the last tick
    #[arg(long)]
    pub latest: bool,

    #[arg(long, default_value_t = 60)]
    pub interval_secs: u64,

    /// Stop after this many ticks; runs until interrupted otherwise
    #[arg(long)]
    pub ticks: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_MAX_PROMPT_CHARS)]
    pub max_prompt_chars: usize,

    /// Append every summary as a JSON line to this file
    #[arg(long)]
    pub summaries_out: Option<PathBuf>
}

#[derive(Args, Debug, Clone)]
pub struct InsightsArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub agent: AgentArgs
}

#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub load: LoadArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub agent: AgentArgs,

    #[arg(long)]
    pub skip_probe: bool
}
