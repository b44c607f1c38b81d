use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;

/// Workspace tokens live for an hour; refresh well before that.
pub const CREDENTIAL_TTL: Duration = Duration::from_secs(50 * 60);
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_DATABASE: &str = "databricks_postgres";

/// A short-lived database login token issued for one or more instances.
#[derive(Clone, Deserialize)]
pub struct DatabaseCredential {
    pub token: String,
    #[serde(default)]
    pub expiration_time: Option<String>
}

impl Debug for DatabaseCredential {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("DatabaseCredential")
            .field("token", &"<redacted>")
            .field("expiration_time", &self.expiration_time)
            .finish()
    }
}

/// Everything needed to open a PostgreSQL session.
#[derive(Clone)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub require_tls: bool
}

impl Debug for ConnectionInfo {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("ConnectionInfo")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("require_tls", &self.require_tls)
            .finish()
    }
}

impl Display for ConnectionInfo {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

/// Credentials keyed by instance name, so stages sharing a process reuse one token.
#[derive(Clone)]
pub struct CredentialCache {
    cache: Cache<String, DatabaseCredential>
}

impl CredentialCache {
    pub fn new(time_to_live: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(16)
                .time_to_live(time_to_live)
                .build()
        }
    }

    pub async fn get(&self, instance: &str) -> Option<DatabaseCredential> {
        self.cache.get(instance).await
    }

    pub async fn insert(&self, instance: &str, credential: DatabaseCredential) {
        self.cache.insert(instance.to_string(), credential).await;
    }
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new(CREDENTIAL_TTL)
    }
}
