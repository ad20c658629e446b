pub mod config;
pub mod logging_system;
pub mod shutdown;

pub use config::{CONFIG_ENV_VAR, Config, ConfigError};
pub use logging_system::{LogDirective, LoggingError, LoggingSystem, setup_logging_safe};
pub use shutdown::{ShutdownSignal, spawn_signal_listener, wait_for_signal};

use crate::domain::{LogEvent, LogLevel};
use crate::pipeline::{RemoteLogger, ShutdownReport};
use crate::sender::HttpConnectionFactory;
use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Logger name given to plain-text input lines.
pub const STDIN_LOGGER: &str = "stdin";

/// The `rask-remote-logger` binary: forwards newline-delimited events from an
/// input stream to the collector.
pub struct App {
    config: Config,
    logger: RemoteLogger,
}

impl App {
    /// Resolve configuration from arguments, environment and an optional file.
    pub fn load_config<I, T>(args: I) -> anyhow::Result<Config>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::from_args_and_env(args).context("invalid configuration")?;

        match &config.config_file {
            Some(path) => {
                eprintln!("Loading configuration from file: {}", path.display());
                Config::from_file(path)
                    .with_context(|| format!("failed to load config file {}", path.display()))
            }
            None => Ok(config),
        }
    }

    /// Build the HTTP factory and start the pipeline on the current runtime.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let factory = HttpConnectionFactory::new(config.http_client_config())
            .context("failed to build HTTP client")?;
        let logger = RemoteLogger::new(config.pipeline_config()?, factory)?;

        info!("Starting rask-remote-logger v{}", crate::VERSION);
        info!(
            "Configuration: endpoint={}, workers={}, max_queue_size={}",
            config.endpoint, config.parallel_requests, config.max_queue_size
        );

        Ok(Self { config, logger })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn logger(&self) -> &RemoteLogger {
        &self.logger
    }

    /// Forward lines from `input` until it ends or `cancel` fires, then shut
    /// the pipeline down with the configured grace period.
    pub async fn run<R>(self, input: R, cancel: CancellationToken) -> anyhow::Result<ShutdownReport>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line.context("failed to read input")?,
                _ = cancel.cancelled() => break,
            };
            let Some(line) = line else {
                info!("Input closed");
                break;
            };
            let Some(event) = parse_line(&line) else {
                continue;
            };

            if let Err(e) = self.logger.submit(event) {
                warn!("Failed to submit event: {}", e);
            }
        }

        Ok(self.logger.shutdown(self.config.shutdown_grace).await)
    }
}

/// Turn one input line into an event. JSON objects are read as serialized
/// events; anything else becomes an INFO event from the `stdin` logger.
pub fn parse_line(line: &str) -> Option<LogEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with('{') {
        match serde_json::from_str::<LogEvent>(trimmed) {
            Ok(event) => return Some(event),
            Err(e) => debug!("Line is not a JSON event ({}), shipping as text", e),
        }
    }

    Some(LogEvent::builder(LogLevel::Info, STDIN_LOGGER, trimmed).build())
}

// Main entry point for the application
pub async fn main() -> anyhow::Result<()> {
    let config = App::load_config(std::env::args())?;

    if let Err(e) = setup_logging_safe(config.log_level, &config.log_directives) {
        eprintln!("Warning: {e}");
    }

    let app = App::from_config(config)?;
    let cancel = CancellationToken::new();
    let signals = spawn_signal_listener(cancel.clone());

    let report = app
        .run(BufReader::new(tokio::io::stdin()), cancel.clone())
        .await?;
    cancel.cancel();
    if let Err(e) = signals.await {
        debug!("Signal listener ended abnormally: {}", e);
    }

    println!("{}", serde_json::to_string_pretty(&report.stats)?);
    if report.undelivered > 0 {
        warn!("{} events were not delivered", report.undelivered);
    }

    // The blocking stdin reader cannot be interrupted; exit instead of
    // waiting for it during runtime teardown.
    std::process::exit(0)
}
