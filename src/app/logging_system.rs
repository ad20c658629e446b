use crate::domain::LogLevel;
use parking_lot::RwLock;
use std::sync::OnceLock;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoggingError {
    #[error("Invalid log directive '{0}' (expected target=level)")]
    InvalidDirective(String),
    #[error("Failed to build filter '{filter}': {details}")]
    InvalidFilter { filter: String, details: String },
    #[error("Failed to install global subscriber: {0}")]
    InstallFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirective {
    pub target: String,
    pub level: LogLevel,
}

impl LogDirective {
    pub fn new(target: impl Into<String>, level: LogLevel) -> Self {
        Self {
            target: target.into(),
            level,
        }
    }

    pub fn to_filter_string(&self) -> String {
        format!("{}={}", self.target, self.level.as_str().to_lowercase())
    }
}

/// Builds the `EnvFilter` for the shipper's own diagnostics.
pub struct LoggingSystem {
    directives: RwLock<Vec<LogDirective>>,
    fallback_level: LogLevel,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self {
            directives: RwLock::new(Vec::new()),
            fallback_level: LogLevel::Info,
        }
    }

    /// Add a `target=level` directive. A malformed directive is skipped and an
    /// unknown level falls back to the default level.
    pub fn add_directive(&self, directive_str: &str) -> Result<(), LoggingError> {
        let Some((target, level)) = directive_str.split_once('=') else {
            eprintln!(
                "Warning: {}, skipping directive",
                LoggingError::InvalidDirective(directive_str.to_string())
            );
            return Ok(());
        };
        if target.is_empty() {
            return Err(LoggingError::InvalidDirective(directive_str.to_string()));
        }

        let level = level.parse().unwrap_or_else(|e| {
            eprintln!("Warning: {}, using default level", e);
            self.fallback_level
        });
        self.directives.write().push(LogDirective::new(target, level));
        Ok(())
    }

    /// Quiet the HTTP stack unless asked otherwise.
    pub fn add_default_directives(&self) {
        let mut directives = self.directives.write();
        for target in ["hyper", "hyper_util", "reqwest", "h2"] {
            directives.push(LogDirective::new(target, LogLevel::Warn));
        }
    }

    pub fn build_filter_string(&self, default_level: LogLevel) -> String {
        let directives = self.directives.read();

        let mut filter_parts = Vec::with_capacity(directives.len() + 1);
        filter_parts.push(default_level.as_str().to_lowercase());
        for directive in directives.iter() {
            filter_parts.push(directive.to_filter_string());
        }

        filter_parts.join(",")
    }

    pub fn initialize_tracing(&self, default_level: LogLevel) -> Result<(), LoggingError> {
        let filter_string = self.build_filter_string(default_level);

        let env_filter =
            EnvFilter::try_new(&filter_string).map_err(|e| LoggingError::InvalidFilter {
                filter: filter_string.clone(),
                details: e.to_string(),
            })?;

        let subscriber = tracing_subscriber::registry().with(env_filter).with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .compact(),
        );

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| LoggingError::InstallFailed(e.to_string()))
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the global subscriber once. Later calls return the first outcome.
///
/// `directives` are applied after the defaults, so they can loosen the HTTP
/// stack filters again.
pub fn setup_logging_safe(level: LogLevel, directives: &[String]) -> Result<(), LoggingError> {
    static INIT: OnceLock<Result<(), LoggingError>> = OnceLock::new();

    INIT.get_or_init(|| {
        let logging_system = LoggingSystem::new();
        logging_system.add_default_directives();
        for directive in directives {
            logging_system.add_directive(directive)?;
        }
        logging_system.initialize_tracing(level)
    })
    .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_valid_directive() {
        let logging_system = LoggingSystem::new();
        logging_system.add_directive("hyper=warn").unwrap();
        logging_system.add_directive("reqwest=error").unwrap();
        assert_eq!(
            logging_system.build_filter_string(LogLevel::Info),
            "info,hyper=warn,reqwest=error"
        );
    }

    #[test]
    fn test_invalid_directives_fall_back() {
        let logging_system = LoggingSystem::new();

        // no '=' is skipped
        logging_system.add_directive("invalid").unwrap();
        assert_eq!(logging_system.build_filter_string(LogLevel::Warn), "warn");

        // unknown level uses the default
        logging_system.add_directive("target=loud").unwrap();
        assert_eq!(
            logging_system.build_filter_string(LogLevel::Warn),
            "warn,target=info"
        );

        assert!(logging_system.add_directive("=debug").is_err());
    }

    #[test]
    fn test_default_directives_quiet_http_stack() {
        let logging_system = LoggingSystem::new();
        logging_system.add_default_directives();

        let filter = logging_system.build_filter_string(LogLevel::Debug);
        assert!(filter.starts_with("debug,"));
        assert!(filter.contains("hyper=warn"));
        assert!(filter.contains("reqwest=warn"));
        assert!(filter.contains("h2=warn"));
    }

    #[test]
    fn test_setup_is_idempotent() {
        let first = setup_logging_safe(LogLevel::Info, &[]);
        let second = setup_logging_safe(LogLevel::Debug, &["hyper=debug".to_string()]);
        assert_eq!(first, second);
    }
}
