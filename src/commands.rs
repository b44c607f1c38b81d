use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal::ctrl_c;
use tracing::{info, warn};

use crate::agent::{ChatCompletionsClient, InsightAgent, InsightSink, ModelSettings};
use crate::config::{
    AgentSettings, CheckArgs, DemoArgs, GenerateArgs, InsightsArgs, LoadSettings, ProvisionArgs, StoreSettings,
    StoreTarget
};
use crate::connectivity::{probe_records, verify, PROBE_ROWS};
use crate::generator::{LoadGenerator, MetricsSink, RunSummary, SyntheticGenerator};
use crate::provisioner::{CatalogRequest, CredentialCache, ProvisionRequest, Provisioner, WorkspaceClient, DEFAULT_PORT};
use crate::storage::{MemoryStore, PostgresStore, TransactionStore};

/// Default generator run inside `demo` when no stop condition is given.
const DEMO_RUN_DURATION: Duration = Duration::from_secs(30);

/// Opens the store for each stage.
///
/// PostgreSQL stages get their own single-connection pool; credentials issued
/// by the workspace are shared through the cache. The memory store is one
/// instance for the whole process.
pub struct StoreFactory {
    settings: StoreSettings,
    credentials: CredentialCache,
    memory: Arc<MemoryStore>
}

impl StoreFactory {
    pub fn new(settings: StoreSettings) -> Self {
        let memory = Arc::new(MemoryStore::new(settings.table.clone()));

        Self {
            settings,
            credentials: CredentialCache::default(),
            memory
        }
    }

    pub async fn open(&self) -> Result<Arc<dyn TransactionStore>> {
        let table = self.settings.table.clone();

        match &self.settings.target {
            StoreTarget::Memory => {
                info!("Using the in-memory store for [{table}]");
                Ok(self.memory.clone())
            },
            StoreTarget::Direct(connection) => Ok(Arc::new(PostgresStore::connect(connection, table).await?)),
            StoreTarget::Workspace { workspace, database, port } => {
                let client = WorkspaceClient::new(&workspace.host, &workspace.token)?;
                let provisioner = Provisioner::new(client).with_credentials(self.credentials.clone());
                let connection = provisioner.connection_info(&workspace.instance, database, *port).await?;

                Ok(Arc::new(PostgresStore::connect(&connection, table).await?))
            }
        }
    }
}

pub async fn provision(args: ProvisionArgs) -> Result<()> {
    let workspace = args.workspace.settings()?;
    let client = WorkspaceClient::new(&workspace.host, &workspace.token)?;
    let provisioner = Provisioner::new(client);

    let request = ProvisionRequest {
        instance: workspace.instance.clone(),
        capacity: args.capacity,
        create_if_missing: args.create,
        wait: Duration::from_secs(args.wait_secs)
    };

    let instance = provisioner.provision(&request).await?;

    if let Some(catalog) = args.catalog {
        provisioner.register_catalog(&CatalogRequest {
            name: catalog,
            database_instance_name: instance.name.clone(),
            database_name: args.database.clone(),
            create_database_if_not_exists: true
        }).await?;
    }

    let connection = provisioner.connection_info(&workspace.instance, &args.database, DEFAULT_PORT).await?;

    let mut output = stdout().lock();
    writeln!(output, "instance: {} ({:?})", instance.name, instance.state)?;
    writeln!(output, "capacity: {}", instance.capacity.as_deref().unwrap_or("unknown"))?;
    writeln!(output, "postgres version: {}", instance.pg_version.as_deref().unwrap_or("unknown"))?;
    writeln!(output, "host: {}", connection.host)?;
    writeln!(output, "port: {}", connection.port)?;
    writeln!(output, "database: {}", connection.database)?;
    writeln!(output, "user: {}", connection.user)?;
    writeln!(output, "token: <issued, valid for about an hour>")?;
    output.flush()?;

    Ok(())
}

pub async fn check(args: CheckArgs) -> Result<()> {
    let factory = StoreFactory::new(args.database.settings()?);
    run_check(&factory, args.skip_probe).await
}

pub async fn generate(args: GenerateArgs) -> Result<()> {
    let load = args.load.settings()?;
    let factory = StoreFactory::new(args.database.settings()?);

    run_generate(&factory, load).await.map(|_| ())
}

pub async fn insights(args: InsightsArgs) -> Result<()> {
    let model = args.model.settings(&args.database.workspace)?;
    let agent = args.agent.settings(None)?;
    let factory = StoreFactory::new(args.database.settings()?);

    run_insights(&factory, model, agent).await
}

/// check, then generate, then a single insight tick, all in one process.
pub async fn demo(args: DemoArgs) -> Result<()> {
    let mut load = args.load.settings()?;
    let model = args.model.settings(&args.database.workspace)?;
    let agent = args.agent.settings(Some(1))?;
    let factory = StoreFactory::new(args.database.settings()?);

    if args.load.duration_secs.is_none() && args.load.total_rows.is_none() {
        load.config.stop.duration = Some(DEMO_RUN_DURATION);
    }

    info!("Demo stage 1/3: connectivity check");
    run_check(&factory, args.skip_probe).await?;

    info!("Demo stage 2/3: synthetic load");
    let summary = run_generate(&factory, load).await?;

    if summary.rows == 0 {
        warn!("No rows were generated; the insight stage will find nothing to summarize");
    }

    info!("Demo stage 3/3: insights");
    run_insights(&factory, model, agent).await
}

async fn run_check(factory: &StoreFactory, skip_probe: bool) -> Result<()> {
    let store = factory.open().await?;
    let probes = if skip_probe { Vec::new() } else { probe_records(PROBE_ROWS)? };
    let report = verify(store.as_ref(), &probes).await?;

    let mut output = stdout().lock();
    writeln!(output, "{report}")?;
    output.flush()?;

    Ok(())
}

/// Returns the committed work, also when interrupted with Ctrl-C.
async fn run_generate(factory: &StoreFactory, settings: LoadSettings) -> Result<RunSummary> {
    let records = match settings.seed {
        Some(seed) => SyntheticGenerator::seeded(seed, settings.promo.clone()),
        None => SyntheticGenerator::from_entropy(settings.promo.clone())
    };

    let output: Box<dyn Write> = match &settings.metrics_out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Could not create metrics file [{}]", path.display()))?
        )),
        None => Box::new(stdout())
    };

    let store = factory.open().await?;
    let mut sink = MetricsSink::new(output);
    let mut generator = LoadGenerator::new(store, records, settings.config);

    //NOTE: Dropping the run future mid-insert drops the open transaction, which rolls it back
    let outcome = tokio::select! {
        result = generator.run(&mut sink) => Some(result),
        _ = ctrl_c() => None
    };

    match outcome {
        Some(result) => Ok(result?),
        None => {
            let progress = generator.progress();
            warn!("Interrupted; committed work so far: {progress}");
            Ok(progress)
        }
    }
}

async fn run_insights(factory: &StoreFactory, model: ModelSettings, agent: AgentSettings) -> Result<()> {
    let client = ChatCompletionsClient::new(model)?;

    info!("Summaries come from [{}]", client.url());

    let store = factory.open().await?;
    let mut sink = InsightSink::new(stdout());

    if let Some(path) = &agent.summaries_out {
        sink = sink.with_archive(path).with_context(|| format!("Could not open summaries archive [{}]", path.display()))?;
    }

    let mut insight_agent = InsightAgent::new(store, client, agent.prompts);

    let outcome = tokio::select! {
        result = insight_agent.run(agent.window, agent.schedule, &mut sink) => Some(result),
        _ = ctrl_c() => None
    };

    match outcome {
        Some(result) => {
            result?;
        },
        None => warn!("Interrupted; last checkpoint: {:?}", insight_agent.checkpoint())
    }

    Ok(())
}
