use std::time::Duration;

use thiserror::Error;

use crate::provisioner::InstanceState;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Workspace request to [{endpoint}] failed: {source}")]
    Connectivity {
        endpoint: String,
        #[source]
        source: reqwest::Error
    },
    #[error("Workspace API [{endpoint}] returned {status}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String
    },
    #[error("Workspace API [{endpoint}] returned an unreadable body: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error
    },
    #[error("Database instance [{instance}] does not exist")]
    InstanceNotFound {
        instance: String
    },
    #[error("Database instance [{instance}] is [{state:?}], expected [Available]")]
    NotAvailable {
        instance: String,
        state: InstanceState
    },
    #[error("Database instance [{instance}] has no read/write endpoint yet")]
    MissingEndpoint {
        instance: String
    },
    #[error("Database instance [{instance}] did not become available within {waited:?}")]
    Timeout {
        instance: String,
        waited: Duration
    },
    #[error("Workspace client error: {0}")]
    Client(String)
}

impl ProvisionError {
    pub fn connectivity(endpoint: &str, source: reqwest::Error) -> Self {
        Self::Connectivity { endpoint: endpoint.to_string(), source }
    }

    pub fn decode(endpoint: &str, source: reqwest::Error) -> Self {
        Self::Decode { endpoint: endpoint.to_string(), source }
    }
}
