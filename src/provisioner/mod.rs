mod credentials;
mod errors;
mod workspace_client;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::types::InstanceName;

pub use credentials::{ConnectionInfo, CredentialCache, DatabaseCredential, DEFAULT_DATABASE, DEFAULT_PORT};
pub use errors::ProvisionError;
pub use workspace_client::WorkspaceClient;
pub(crate) use workspace_client::normalize_host;

pub const DEFAULT_CAPACITY: &str = "CU_1";
const POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceState {
    Starting,
    Available,
    Updating,
    Stopped,
    Deleting,
    FailingOver,
    #[default]
    #[serde(other)]
    Unknown
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseInstance {
    pub name: String,
    #[serde(default)]
    pub state: InstanceState,
    #[serde(default)]
    pub read_write_dns: Option<String>,
    #[serde(default)]
    pub capacity: Option<String>,
    #[serde(default)]
    pub pg_version: Option<String>
}

/// Registers a catalog entry so the instance's tables show up for analytics.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogRequest {
    pub name: String,
    pub database_instance_name: String,
    pub database_name: String,
    pub create_database_if_not_exists: bool
}

#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub instance: InstanceName,
    pub capacity: String,
    pub create_if_missing: bool,
    pub wait: Duration
}

/// The workspace calls the provisioner depends on.
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    async fn current_user(&self) -> Result<String, ProvisionError>;
    async fn get_instance(&self, name: &InstanceName) -> Result<Option<DatabaseInstance>, ProvisionError>;
    async fn create_instance(&self, name: &InstanceName, capacity: &str) -> Result<DatabaseInstance, ProvisionError>;
    async fn generate_credential(&self, name: &InstanceName) -> Result<DatabaseCredential, ProvisionError>;
    async fn create_catalog(&self, request: &CatalogRequest) -> Result<(), ProvisionError>;
}

/// Creates database instances and turns them into connection parameters.
pub struct Provisioner<W: WorkspaceApi> {
    api: W,
    credentials: CredentialCache,
    poll_interval: Duration
}

impl<W: WorkspaceApi> Provisioner<W> {
    pub fn new(api: W) -> Self {
        Self {
            api,
            credentials: CredentialCache::default(),
            poll_interval: POLL_INTERVAL
        }
    }

    /// Shares a credential cache with other provisioners in the same process.
    pub fn with_credentials(mut self, credentials: CredentialCache) -> Self {
        self.credentials = credentials;
        self
    }

    #[cfg(test)]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Returns the instance once it is available, creating it first when asked to.
    pub async fn provision(&self, request: &ProvisionRequest) -> Result<DatabaseInstance, ProvisionError> {
        let instance = match self.api.get_instance(&request.instance).await? {
            Some(instance) => {
                info!("Database instance [{}] exists in state [{:?}]", instance.name, instance.state);
                instance
            },
            None if request.create_if_missing => {
                info!("Creating database instance [{}] with capacity [{}]", request.instance, request.capacity);
                self.api.create_instance(&request.instance, &request.capacity).await?
            },
            None => return Err(ProvisionError::InstanceNotFound { instance: request.instance.to_string() })
        };

        if instance.state == InstanceState::Available {
            return Ok(instance);
        }

        self.wait_until_available(&request.instance, request.wait).await
    }

    /// Polls the instance until it reports `AVAILABLE` or `timeout` elapses.
    pub async fn wait_until_available(&self, name: &InstanceName, timeout: Duration) -> Result<DatabaseInstance, ProvisionError> {
        let started = Instant::now();

        loop {
            let instance = self.api.get_instance(name).await?
                .ok_or_else(|| ProvisionError::InstanceNotFound { instance: name.to_string() })?;

            match instance.state {
                InstanceState::Available => return Ok(instance),
                InstanceState::Stopped | InstanceState::Deleting => {
                    return Err(ProvisionError::NotAvailable { instance: name.to_string(), state: instance.state });
                },
                state => debug!("Database instance [{name}] is [{state:?}], waiting")
            }

            let waited = started.elapsed();

            if waited >= timeout {
                return Err(ProvisionError::Timeout { instance: name.to_string(), waited });
            }

            sleep(self.poll_interval.min(timeout - waited)).await;
        }
    }

    pub async fn register_catalog(&self, request: &CatalogRequest) -> Result<(), ProvisionError> {
        info!("Registering catalog [{}] for instance [{}]", request.name, request.database_instance_name);
        self.api.create_catalog(request).await
    }

    /// A credential for `name`, reused until the cache entry expires.
    pub async fn credential(&self, name: &InstanceName) -> Result<DatabaseCredential, ProvisionError> {
        if let Some(credential) = self.credentials.get(name.as_str()).await {
            debug!("Reusing cached credential for [{name}]");
            return Ok(credential);
        }

        let credential = self.api.generate_credential(name).await?;
        self.credentials.insert(name.as_str(), credential.clone()).await;

        Ok(credential)
    }

    pub async fn connection_info(&self, name: &InstanceName, database: &str, port: u16) -> Result<ConnectionInfo, ProvisionError> {
        let instance = self.api.get_instance(name).await?
            .ok_or_else(|| ProvisionError::InstanceNotFound { instance: name.to_string() })?;

        if instance.state != InstanceState::Available {
            warn!("Database instance [{name}] reports [{:?}], connecting anyway", instance.state);
        }

        let host = instance.read_write_dns
            .filter(|dns| !dns.trim().is_empty())
            .ok_or_else(|| ProvisionError::MissingEndpoint { instance: name.to_string() })?;

        let user = self.api.current_user().await?;
        let credential = self.credential(name).await?;

        Ok(ConnectionInfo {
            host,
            port,
            database: database.to_string(),
            user,
            password: credential.token,
            require_tls: true
        })
    }
}
