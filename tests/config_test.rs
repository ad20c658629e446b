use rask_remote_logger::app::{App, CONFIG_ENV_VAR, Config, ConfigError};
use rask_remote_logger::LogLevel;
use serial_test::serial;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

// SAFETY: every test touching the process environment is #[serial].
fn set_env(key: &str, value: &str) {
    unsafe { std::env::set_var(key, value) };
}

fn remove_env(key: &str) {
    unsafe { std::env::remove_var(key) };
}

#[test]
#[serial]
fn test_config_file_is_loaded() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
endpoint = "https://logs.example.com/ingest"
min_level = "warn"
max_queue_size = 500
error_wait_time_ms = 750
parallel_requests = 3
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.endpoint, "https://logs.example.com/ingest");
    assert_eq!(config.min_level, LogLevel::Warn);
    assert_eq!(config.max_queue_size, 500);
    assert_eq!(config.error_wait_time, Duration::from_millis(750));
    assert_eq!(config.parallel_requests, 3);
}

#[test]
#[serial]
fn test_config_file_option_takes_over() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "parallel_requests = 7").unwrap();
    let path = file.path().to_string_lossy().to_string();

    let config =
        App::load_config(["rask-remote-logger", "--config-file", path.as_str()]).unwrap();
    assert_eq!(config.parallel_requests, 7);
}

#[test]
#[serial]
fn test_missing_config_file_is_a_file_error() {
    let result = Config::from_file("/nonexistent/rask-remote-logger.toml");
    assert!(matches!(result, Err(ConfigError::FileError(_))));
}

#[test]
#[serial]
fn test_invalid_values_are_rejected() {
    let cases = [
        ("endpoint = \"not a url\"", "url"),
        ("endpoint = \"ftp://collector/log\"", "scheme"),
        ("max_queue_size = 0", "queue"),
        ("low_water_fraction = 0.0", "fraction"),
        ("low_water_fraction = 1.5", "fraction"),
        ("parallel_requests = 0", "workers"),
        ("queue_check_interval_ms = 0", "interval"),
        ("error_wait_time_ms = 0", "error wait"),
    ];

    for (toml, label) in cases {
        assert!(Config::from_config_str(toml).is_err(), "{label} should fail");
    }
}

#[test]
#[serial]
fn test_from_env_reads_individual_variables() {
    remove_env(CONFIG_ENV_VAR);
    set_env("RASK_REMOTE_ENDPOINT", "http://collector:9600/log");
    set_env("MIN_LEVEL", "error");
    set_env("PARALLEL_REQUESTS", "6");
    set_env("ENABLE_COMPRESSION", "true");

    let config = Config::from_env().unwrap();

    remove_env("RASK_REMOTE_ENDPOINT");
    remove_env("MIN_LEVEL");
    remove_env("PARALLEL_REQUESTS");
    remove_env("ENABLE_COMPRESSION");

    assert_eq!(config.endpoint, "http://collector:9600/log");
    assert_eq!(config.min_level, LogLevel::Error);
    assert_eq!(config.parallel_requests, 6);
    assert!(config.enable_compression);
}

#[test]
#[serial]
fn test_bad_env_value_is_an_env_error() {
    remove_env(CONFIG_ENV_VAR);
    set_env("MAX_QUEUE_SIZE", "lots");

    let result = Config::from_env();
    remove_env("MAX_QUEUE_SIZE");

    assert!(matches!(result, Err(ConfigError::EnvError(_))));
}

#[test]
#[serial]
fn test_inline_toml_sits_under_cli_arguments() {
    set_env(
        CONFIG_ENV_VAR,
        r#"
parallel_requests = 9
max_queue_size = 123
"#,
    );

    let config =
        Config::from_args_and_env(["rask-remote-logger", "--parallel-requests", "2"]).unwrap();
    remove_env(CONFIG_ENV_VAR);

    // CLI wins where given, inline TOML fills the rest.
    assert_eq!(config.parallel_requests, 2);
    assert_eq!(config.max_queue_size, 123);
}

#[test]
#[serial]
fn test_inline_toml_alone() {
    set_env(CONFIG_ENV_VAR, "error_wait_time_ms = 100");
    let config = Config::from_env();
    remove_env(CONFIG_ENV_VAR);

    assert_eq!(config.unwrap().error_wait_time, Duration::from_millis(100));
}
