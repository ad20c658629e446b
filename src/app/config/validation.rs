use super::{Config, ConfigError};
use url::Url;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate endpoint URL
        let endpoint = Url::parse(&self.endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{}': {}", self.endpoint, e))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "Endpoint must use http or https, got '{}'",
                endpoint.scheme()
            )));
        }

        if self.max_queue_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "Max queue size must be greater than 0".to_string(),
            ));
        }

        if !(self.low_water_fraction > 0.0 && self.low_water_fraction <= 1.0) {
            return Err(ConfigError::InvalidConfig(format!(
                "Low water fraction must be in (0, 1], got {}",
                self.low_water_fraction
            )));
        }

        if self.parallel_requests == 0 {
            return Err(ConfigError::InvalidConfig(
                "Parallel requests must be at least 1".to_string(),
            ));
        }

        // Validate intervals and timeouts
        if self.queue_check_interval_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "Queue check interval must be greater than 0".to_string(),
            ));
        }
        if self.error_wait_time_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "Error wait time must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }
        if self.connection_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Connection timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
