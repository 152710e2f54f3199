mod admin_config;
mod circuit_breaker_config;
mod config;
mod downstream_config;
mod error;
mod log_level;
mod logging_config;
mod resolver_config;
mod server_config;
mod store_backend;
mod store_config;
mod webhook_config;

#[cfg(test)]
mod tests;

pub use admin_config::AdminConfig;
pub use circuit_breaker_config::CircuitBreakerConfig;
pub use config::Config;
pub use downstream_config::DownstreamConfig;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use resolver_config::{CANONICAL_FIELDS, HeaderMappingConfig, ResolverConfig};
pub use server_config::ServerConfig;
pub use store_backend::StoreBackend;
pub use store_config::StoreConfig;
pub use webhook_config::WebhookConfig;

const CONFIG_DIR_ENV: &str = "SG_CONFIG_DIR";
const DEFAULT_CONFIG_DIR_NAME: &str = ".shadowgate";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 9091;
const MIN_PORT: u16 = 1024;
const DEFAULT_MAX_CONNECTIONS: usize = 1024;
const MIN_MAX_CONNECTIONS: usize = 1;
const MAX_MAX_CONNECTIONS: usize = 100_000;

const DEFAULT_STORE_FILENAME: &str = "shadow.db";
const DEFAULT_PROVIDER: &str = "authentik";

const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "log";
