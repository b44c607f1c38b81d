use thiserror::Error;

use crate::agent::AgentError;
use crate::generator::GeneratorError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {what}: set {hint}")]
    Missing {
        what: &'static str,
        hint: &'static str
    },
    #[error("Invalid value for [{option}]: {reason}")]
    Invalid {
        option: &'static str,
        reason: String
    },
    #[error(transparent)]
    Load(#[from] GeneratorError),
    #[error(transparent)]
    Agent(#[from] AgentError)
}

impl ConfigError {
    pub fn invalid(option: &'static str, reason: impl ToString) -> Self {
        Self::Invalid { option, reason: reason.to_string() }
    }
}
