use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model endpoint [{endpoint}] is unreachable: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error
    },
    #[error("Model endpoint [{endpoint}] returned {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String
    },
    #[error("Model endpoint [{endpoint}] returned a malformed response: {reason}")]
    Malformed {
        endpoint: String,
        reason: String
    },
    #[error("Model endpoint [{endpoint}] returned an empty completion")]
    Empty {
        endpoint: String
    },
    #[error("Model client error: {0}")]
    Client(String)
}

impl ModelError {
    pub fn malformed(endpoint: &str, reason: impl ToString) -> Self {
        Self::Malformed { endpoint: endpoint.to_string(), reason: reason.to_string() }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Could not read the transaction window: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Invalid agent schedule: {0}")]
    InvalidSchedule(String),
    #[error("Could not publish insight: {0}")]
    Output(#[from] std::io::Error),
    #[error("Could not serialize insight: {0}")]
    Serialize(#[from] serde_json::Error)
}
