use std::path::PathBuf;
use std::time::Duration;

use crate::agent::{ModelSettings, PromptBuilder, Schedule, Window};
use crate::config::cli::{AgentArgs, DatabaseArgs, LoadArgs, ModelArgs, StoreKind, WorkspaceArgs};
use crate::config::errors::ConfigError;
use crate::generator::{LoadConfig, PromoBias};
use crate::models::Product;
use crate::provisioner::{normalize_host, ConnectionInfo};
use crate::types::{InstanceName, TableName};

/// Smallest prompt that still fits the analytics block and a few rows.
pub const MIN_PROMPT_CHARS: usize = 2_000;
const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct WorkspaceSettings {
    pub host: String,
    pub token: String,
    pub instance: InstanceName
}

#[derive(Debug, Clone)]
pub enum StoreTarget {
    Memory,
    /// Connection parameters given directly.
    Direct(ConnectionInfo),
    /// Host and token are resolved through the workspace for `instance`.
    Workspace {
        workspace: WorkspaceSettings,
        database: String,
        port: u16
    }
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub target: StoreTarget,
    pub table: TableName
}

#[derive(Debug, Clone)]
pub struct LoadSettings {
    pub config: LoadConfig,
    pub promo: PromoBias,
    pub seed: Option<u64>,
    pub metrics_out: Option<PathBuf>
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub window: Window,
    pub schedule: Schedule,
    pub prompts: PromptBuilder,
    pub summaries_out: Option<PathBuf>
}

impl WorkspaceArgs {
    pub fn settings(&self) -> Result<WorkspaceSettings, ConfigError> {
        let host = non_empty(self.workspace_host.as_deref())
            .ok_or(ConfigError::Missing { what: "workspace host", hint: "--workspace-host or DATABRICKS_HOST" })?;
        let token = non_empty(self.workspace_token.as_deref())
            .ok_or(ConfigError::Missing { what: "workspace token", hint: "--workspace-token or DATABRICKS_TOKEN" })?;

        Ok(WorkspaceSettings {
            host: normalize_host(host).map_err(|error| ConfigError::invalid("workspace-host", error))?,
            token: token.to_string(),
            instance: self.instance.clone()
        })
    }
}

impl DatabaseArgs {
    pub fn settings(&self) -> Result<StoreSettings, ConfigError> {
        let target = match self.store {
            StoreKind::Memory => StoreTarget::Memory,
            StoreKind::Postgres => match non_empty(self.pg_host.as_deref()) {
                Some(host) => StoreTarget::Direct(self.direct_connection(host)?),
                None => StoreTarget::Workspace {
                    workspace: self.workspace.settings()?,
                    database: self.database.clone(),
                    port: self.pg_port
                }
            }
        };

        Ok(StoreSettings { target, table: self.table.clone() })
    }

    fn direct_connection(&self, host: &str) -> Result<ConnectionInfo, ConfigError> {
        let user = non_empty(self.pg_user.as_deref())
            .ok_or(ConfigError::Missing { what: "database user", hint: "--pg-user or PGUSER" })?;
        let password = non_empty(self.pg_password.as_deref())
            .ok_or(ConfigError::Missing { what: "database password", hint: "--pg-password or PGPASSWORD" })?;

        Ok(ConnectionInfo {
            host: host.to_string(),
            port: self.pg_port,
            database: self.database.clone(),
            user: user.to_string(),
            password: password.to_string(),
            require_tls: !is_loopback(host)
        })
    }
}

impl LoadArgs {
    pub fn settings(&self) -> Result<LoadSettings, ConfigError> {
        let config = LoadConfig::new(
            self.rate,
            self.batch_size,
            self.duration_secs.map(Duration::from_secs),
            self.total_rows
        )?;

        Ok(LoadSettings {
            config,
            promo: parse_promo(&self.promo, self.promo_weight)?,
            seed: self.seed,
            metrics_out: self.metrics_out.clone()
        })
    }
}

impl ModelArgs {
    /// `workspace` supplies the default endpoint and the bearer token.
    pub fn settings(&self, workspace: &WorkspaceArgs) -> Result<ModelSettings, ConfigError> {
        let endpoint = match non_empty(self.model_endpoint.as_deref()) {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => {
                let host = non_empty(workspace.workspace_host.as_deref()).ok_or(ConfigError::Missing {
                    what: "model endpoint",
                    hint: "--model-endpoint, LAKEBASE_MODEL_ENDPOINT or a workspace host"
                })?;

                format!("{}/serving-endpoints", normalize_host(host).map_err(|error| ConfigError::invalid("workspace-host", error))?)
            }
        };

        if self.model.trim().is_empty() {
            return Err(ConfigError::invalid("model", "model name is empty"));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::invalid("max-tokens", "must be at least 1"));
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
                return Err(ConfigError::invalid("temperature", format!("{temperature} is outside 0.0..={MAX_TEMPERATURE}")));
            }
        }

        if self.model_timeout_secs == 0 {
            return Err(ConfigError::invalid("model-timeout-secs", "must be at least 1"));
        }

        Ok(ModelSettings {
            endpoint,
            model: self.model.trim().to_string(),
            api_key: non_empty(workspace.workspace_token.as_deref()).map(str::to_string),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: Duration::from_secs(self.model_timeout_secs)
        })
    }
}

impl AgentArgs {
    /// `default_ticks` applies when `--ticks` is not given.
    pub fn settings(&self, default_ticks: Option<u64>) -> Result<AgentSettings, ConfigError> {
        if self.window_rows == 0 {
            return Err(ConfigError::invalid("window-rows", "must be at least 1"));
        }

        if self.max_prompt_chars < MIN_PROMPT_CHARS {
            return Err(ConfigError::invalid("max-prompt-chars", format!("must be at least {MIN_PROMPT_CHARS}")));
        }

        if self.ticks == Some(0) {
            return Err(ConfigError::invalid("ticks", "must be at least 1"));
        }

        let window = if self.latest {
            Window::Latest(self.window_rows)
        } else {
            Window::SinceCheckpoint { max_rows: self.window_rows }
        };

        Ok(AgentSettings {
            window,
            schedule: Schedule::new(Duration::from_secs(self.interval_secs), self.ticks.or(default_ticks))?,
            prompts: PromptBuilder::new(self.max_prompt_chars),
            summaries_out: self.summaries_out.clone()
        })
    }
}

pub fn parse_promo(value: &str, weight: u32) -> Result<PromoBias, ConfigError> {
    let value = value.trim();

    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(PromoBias::none());
    }

    let mut promoted = Vec::new();

    for name in value.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let product: Product = name.parse().map_err(|error| ConfigError::invalid("promo", error))?;

        if !promoted.contains(&product) {
            promoted.push(product);
        }
    }

    Ok(PromoBias::new(promoted, weight))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn is_loopback(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}
