mod cli;
mod errors;
mod settings;

pub use cli::{CheckArgs, Cli, Command, DemoArgs, GenerateArgs, InsightsArgs, ProvisionArgs, StoreKind};
pub use errors::ConfigError;
pub use settings::{parse_promo, AgentSettings, LoadSettings, StoreSettings, StoreTarget};
