mod errors;
mod identifier;
mod throughput;

pub use identifier::{InstanceName, TableName};
pub use throughput::{BatchSize, TargetRate};

pub type TransactionId = uuid::Uuid;
pub type BatchNumber = u64;
