use super::ConfigError;
use super::serde_helpers::{load_env_path_opt, load_env_string, load_env_var};
use crate::buffer::{DEFAULT_LOW_WATER_FRACTION, OverflowConfig};
use crate::domain::LogLevel;
use crate::pipeline::PipelineConfig;
use crate::sender::HttpClientConfig;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Inline TOML configuration, applied beneath CLI arguments.
pub const CONFIG_ENV_VAR: &str = "RASK_REMOTE_CONFIG";

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Collector endpoint the events are POSTed to
    #[arg(
        long,
        env = "RASK_REMOTE_ENDPOINT",
        default_value = "http://localhost:9600/v1/logs"
    )]
    pub endpoint: String,

    /// Minimum severity that is shipped
    #[arg(long, env = "MIN_LEVEL", default_value = "info")]
    pub min_level: LogLevel,

    /// Queue depth above which the oldest events are evicted
    #[arg(long, env = "MAX_QUEUE_SIZE", default_value = "10000")]
    pub max_queue_size: usize,

    /// Share of max_queue_size that eviction trims down to
    #[arg(long, env = "LOW_WATER_FRACTION", default_value = "0.75")]
    pub low_water_fraction: f64,

    /// Overflow check interval in milliseconds
    #[arg(long, env = "QUEUE_CHECK_INTERVAL_MS", default_value = "1000")]
    pub queue_check_interval_ms: u64,

    /// Pause after a failed delivery in milliseconds
    #[arg(long, env = "ERROR_WAIT_TIME_MS", default_value = "2000")]
    pub error_wait_time_ms: u64,

    /// Number of concurrent dispatch workers
    #[arg(long, env = "PARALLEL_REQUESTS", default_value = "4")]
    pub parallel_requests: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,

    /// Connection timeout in seconds
    #[arg(long, env = "CONNECTION_TIMEOUT_SECS", default_value = "5")]
    pub connection_timeout_secs: u64,

    /// Gzip request bodies
    #[arg(long, env = "ENABLE_COMPRESSION")]
    pub enable_compression: bool,

    /// User-Agent header override
    #[arg(long, env = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// How long shutdown waits for the queue to drain, in milliseconds
    #[arg(long, env = "SHUTDOWN_GRACE_MS", default_value = "5000")]
    pub shutdown_grace_ms: u64,

    /// Log level of the shipper's own diagnostics
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Extra `target=level` filter directives for the shipper's diagnostics
    #[arg(long = "log-directive", env = "LOG_DIRECTIVES", value_delimiter = ',')]
    pub log_directives: Vec<String>,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub queue_check_interval: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub error_wait_time: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub request_timeout: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub connection_timeout: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub shutdown_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9600/v1/logs".to_string(),
            min_level: LogLevel::Info,
            max_queue_size: 10_000,
            low_water_fraction: DEFAULT_LOW_WATER_FRACTION,
            queue_check_interval_ms: 1000,
            error_wait_time_ms: 2000,
            parallel_requests: 4,
            request_timeout_secs: 10,
            connection_timeout_secs: 5,
            enable_compression: false,
            user_agent: None,
            shutdown_grace_ms: 5000,
            log_level: LogLevel::Info,
            log_directives: Vec::new(),
            config_file: None,
            queue_check_interval: Duration::from_millis(1000),
            error_wait_time: Duration::from_millis(2000),
            request_timeout: Duration::from_secs(10),
            connection_timeout: Duration::from_secs(5),
            shutdown_grace: Duration::from_millis(5000),
        }
    }
}

/// Copy every listed field from `base` unless `config` already moved it off
/// its default.
macro_rules! inherit_unset {
    ($config:ident, $base:ident, $defaults:ident, $($field:ident),+ $(,)?) => {
        $(
            if $config.$field == $defaults.$field && $base.$field != $defaults.$field {
                $config.$field = $base.$field.clone();
            }
        )+
    };
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::parse_from(args);
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(inline) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_config_str(&inline);
        }

        let mut config = Config::default();

        load_env_string("RASK_REMOTE_ENDPOINT", &mut config.endpoint);
        load_env_var("MIN_LEVEL", &mut config.min_level)?;
        load_env_var("MAX_QUEUE_SIZE", &mut config.max_queue_size)?;
        load_env_var("LOW_WATER_FRACTION", &mut config.low_water_fraction)?;
        load_env_var("QUEUE_CHECK_INTERVAL_MS", &mut config.queue_check_interval_ms)?;
        load_env_var("ERROR_WAIT_TIME_MS", &mut config.error_wait_time_ms)?;
        load_env_var("PARALLEL_REQUESTS", &mut config.parallel_requests)?;
        load_env_var("REQUEST_TIMEOUT_SECS", &mut config.request_timeout_secs)?;
        load_env_var("CONNECTION_TIMEOUT_SECS", &mut config.connection_timeout_secs)?;
        load_env_var("ENABLE_COMPRESSION", &mut config.enable_compression)?;
        if let Ok(user_agent) = std::env::var("USER_AGENT") {
            config.user_agent = Some(user_agent);
        }
        load_env_var("SHUTDOWN_GRACE_MS", &mut config.shutdown_grace_ms)?;
        load_env_var("LOG_LEVEL", &mut config.log_level)?;
        if let Ok(directives) = std::env::var("LOG_DIRECTIVES") {
            config.log_directives = directives
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from)
                .collect();
        }
        load_env_path_opt("CONFIG_FILE", &mut config.config_file);

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    /// CLI arguments (with their env fallbacks) on top of the inline TOML in
    /// `RASK_REMOTE_CONFIG`, on top of the defaults.
    pub fn from_args_and_env<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let base = if let Ok(inline) = std::env::var(CONFIG_ENV_VAR) {
            toml::from_str::<Config>(&inline)?
        } else {
            Config::default()
        };

        let mut config = Config::parse_from(args);
        let defaults = Config::default();
        inherit_unset!(
            config,
            base,
            defaults,
            endpoint,
            min_level,
            max_queue_size,
            low_water_fraction,
            queue_check_interval_ms,
            error_wait_time_ms,
            parallel_requests,
            request_timeout_secs,
            connection_timeout_secs,
            enable_compression,
            user_agent,
            shutdown_grace_ms,
            log_level,
            log_directives,
            config_file,
        );

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_config_str(&content)
    }

    pub fn from_config_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.queue_check_interval = Duration::from_millis(self.queue_check_interval_ms);
        self.error_wait_time = Duration::from_millis(self.error_wait_time_ms);
        self.request_timeout = Duration::from_secs(self.request_timeout_secs);
        self.connection_timeout = Duration::from_secs(self.connection_timeout_secs);
        self.shutdown_grace = Duration::from_millis(self.shutdown_grace_ms);
        Ok(())
    }

    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let endpoint = Url::parse(&self.endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{}': {}", self.endpoint, e))
        })?;

        Ok(PipelineConfig {
            endpoint,
            min_level: self.min_level,
            overflow: OverflowConfig {
                max_queue_size: self.max_queue_size,
                low_water_fraction: self.low_water_fraction,
                check_interval: self.queue_check_interval,
            },
            error_wait_time: self.error_wait_time,
            parallel_requests: self.parallel_requests,
            compress: self.enable_compression,
        })
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        let defaults = HttpClientConfig::default();
        HttpClientConfig {
            timeout: self.request_timeout,
            connection_timeout: self.connection_timeout,
            max_idle_connections: self.parallel_requests.max(defaults.max_idle_connections),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            ..defaults
        }
    }
}
