use crate::{
    AdminConfig, CANONICAL_FIELDS, CONFIG_DIR_ENV, CircuitBreakerConfig, ConfigError,
    ConfigErrorResult, DEFAULT_CONFIG_DIR_NAME, DownstreamConfig, LoggingConfig, ResolverConfig,
    ServerConfig, StoreBackend, StoreConfig, WebhookConfig,
};

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub resolver: ResolverConfig,
    pub webhook: WebhookConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub downstream: DownstreamConfig,
    pub logging: LoggingConfig,
    pub admin: AdminConfig,
}

impl Config {
    /// Load config.
    ///
    /// Loading order:
    /// 1. Check for SG_CONFIG_DIR env var, else use ./.shadowgate/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply SG_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join("config.toml");

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: SG_CONFIG_DIR env var > ./.shadowgate/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR_NAME))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.store.validate()?;
        self.resolver.validate()?;
        self.webhook.validate()?;
        self.circuit_breaker.validate()?;
        self.downstream.validate()?;

        let log_dir = Path::new(&self.logging.dir);
        if log_dir.is_absolute() || self.logging.dir.contains("..") {
            return Err(ConfigError::config(
                "logging.dir must be relative and cannot contain '..'",
            ));
        }

        Ok(())
    }

    /// Absolute path to the SQLite store file.
    pub fn store_path(&self) -> ConfigErrorResult<PathBuf> {
        Ok(Self::config_dir()?.join(&self.store.path))
    }

    /// Absolute path to the log directory.
    pub fn log_dir(&self) -> ConfigErrorResult<PathBuf> {
        Ok(Self::config_dir()?.join(&self.logging.dir))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Log configuration summary (NEVER logs secrets or header values).
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  server: {}:{} (max {} connections, metrics: {})",
            self.server.host,
            self.server.port,
            self.server.max_connections,
            self.server.metrics_enabled
        );

        match self.store.backend {
            StoreBackend::Sqlite => info!("  store: sqlite ({})", self.store.path),
            StoreBackend::Memory => info!(
                "  store: memory (NOT durable, acknowledged: {})",
                self.store.acknowledge_ephemeral
            ),
        }

        let mapped: Vec<&str> = self
            .resolver
            .headers
            .entries()
            .into_iter()
            .map(|(field, _)| field)
            .collect();
        info!(
            "  resolver: mapped=[{}], required=[{}], default_provider={}",
            mapped.join(","),
            self.resolver.required.join(","),
            self.resolver.default_provider
        );

        info!(
            "  webhook: {} (secret: {})",
            if self.webhook.enabled {
                "enabled"
            } else {
                "disabled"
            },
            if self.webhook.secret.is_some() {
                "set"
            } else {
                "unset"
            }
        );

        info!(
            "  circuit_breaker: threshold={}, reset={}s, window={}s",
            self.circuit_breaker.failure_threshold,
            self.circuit_breaker.reset_timeout_secs,
            self.circuit_breaker.failure_window_secs
        );

        if self.downstream.enabled {
            info!(
                "  downstream: {}{} (timeout={}s, retry_after={}s)",
                self.downstream.base_url.as_deref().unwrap_or_default(),
                self.downstream.validate_path,
                self.downstream.timeout_secs,
                self.downstream.retry_after_secs
            );
        } else {
            info!("  downstream: disabled");
        }

        info!(
            "  logging: {} (colored: {})",
            *self.logging.level, self.logging.colored
        );

        info!("  admin: {}", self.admin.enabled);
    }

    fn apply_env_overrides(&mut self) -> ConfigErrorResult<()> {
        // Server
        Self::apply_env_string("SG_SERVER_HOST", &mut self.server.host);
        Self::apply_env_parse("SG_SERVER_PORT", &mut self.server.port)?;
        Self::apply_env_parse(
            "SG_SERVER_MAX_CONNECTIONS",
            &mut self.server.max_connections,
        )?;
        Self::apply_env_bool(
            "SG_SERVER_METRICS_ENABLED",
            &mut self.server.metrics_enabled,
        );

        // Store
        Self::apply_env_parse::<StoreBackend>("SG_STORE_BACKEND", &mut self.store.backend)?;
        Self::apply_env_string("SG_STORE_PATH", &mut self.store.path);
        Self::apply_env_bool("SG_STORE_REQUIRE_DURABLE", &mut self.store.require_durable);
        Self::apply_env_bool(
            "SG_STORE_ACKNOWLEDGE_EPHEMERAL",
            &mut self.store.acknowledge_ephemeral,
        );

        // Resolver
        for field in CANONICAL_FIELDS {
            let var_name = format!("SG_RESOLVER_HEADER_{}", field.to_uppercase());
            if let Some(slot) = self.resolver.headers.slot_mut(field) {
                Self::apply_env_option_string(&var_name, slot);
            }
        }
        if let Ok(val) = std::env::var("SG_RESOLVER_REQUIRED") {
            self.resolver.required = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        Self::apply_env_string(
            "SG_RESOLVER_DEFAULT_PROVIDER",
            &mut self.resolver.default_provider,
        );
        Self::apply_env_string(
            "SG_RESOLVER_GROUPS_SEPARATOR",
            &mut self.resolver.groups_separator,
        );

        // Webhook
        Self::apply_env_bool("SG_WEBHOOK_ENABLED", &mut self.webhook.enabled);
        Self::apply_env_option_string("SG_WEBHOOK_SECRET", &mut self.webhook.secret);
        Self::apply_env_string(
            "SG_WEBHOOK_SIGNATURE_HEADER",
            &mut self.webhook.signature_header,
        );

        // Circuit Breaker
        Self::apply_env_parse(
            "SG_CB_FAILURE_THRESHOLD",
            &mut self.circuit_breaker.failure_threshold,
        )?;
        Self::apply_env_parse(
            "SG_CB_RESET_TIMEOUT_SECS",
            &mut self.circuit_breaker.reset_timeout_secs,
        )?;
        Self::apply_env_parse(
            "SG_CB_FAILURE_WINDOW_SECS",
            &mut self.circuit_breaker.failure_window_secs,
        )?;

        // Downstream
        Self::apply_env_bool("SG_DOWNSTREAM_ENABLED", &mut self.downstream.enabled);
        Self::apply_env_option_string("SG_DOWNSTREAM_BASE_URL", &mut self.downstream.base_url);
        Self::apply_env_string(
            "SG_DOWNSTREAM_VALIDATE_PATH",
            &mut self.downstream.validate_path,
        );
        Self::apply_env_parse(
            "SG_DOWNSTREAM_TIMEOUT_SECS",
            &mut self.downstream.timeout_secs,
        )?;
        Self::apply_env_parse(
            "SG_DOWNSTREAM_RETRY_AFTER_SECS",
            &mut self.downstream.retry_after_secs,
        )?;

        // Logging
        Self::apply_env_parse("SG_LOG_LEVEL", &mut self.logging.level)?;
        Self::apply_env_bool("SG_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_string("SG_LOG_DIR", &mut self.logging.dir);
        Self::apply_env_option_string("SG_LOG_FILE", &mut self.logging.file);

        // Admin
        Self::apply_env_bool("SG_ADMIN_ENABLED", &mut self.admin.enabled);

        Ok(())
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values.
    /// A value that does not parse is an error rather than silently ignored.
    #[track_caller]
    fn apply_env_parse<T>(var_name: &str, target: &mut T) -> ConfigErrorResult<()>
    where
        T: FromStr,
        T::Err: Display,
    {
        if let Ok(val) = std::env::var(var_name) {
            *target = val.parse().map_err(|e: T::Err| {
                ConfigError::config(format!("{} has an invalid value: {}", var_name, e))
            })?;
        }
        Ok(())
    }

    /// Helper: Apply environment variable override for Option<String> values.
    /// An empty value clears the option.
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = if val.is_empty() { None } else { Some(val) };
        }
    }
}
