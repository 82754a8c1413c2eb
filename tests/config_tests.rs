//! Tests for layered configuration.

use std::io::Write;
use std::sync::{Mutex, OnceLock};

use adreport::config::{ReportingConfig, DEFAULT_REPORTING_URL};
use adreport::error::ReportError;
use pretty_assertions::assert_eq;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 8] = [
    "MSADS_CLIENT_ID",
    "MSADS_CLIENT_SECRET",
    "MSADS_REFRESH_TOKEN",
    "MSADS_DEVELOPER_TOKEN",
    "MSADS_CUSTOMER_ID",
    "MSADS_ACCOUNT_ID",
    "MSADS_TOKEN_URL",
    "MSADS_REPORTING_URL",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn clean_env() -> (std::sync::MutexGuard<'static, ()>, EnvGuard) {
    let lock = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }
    (lock, guard)
}

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(text.as_bytes()).expect("write config");
    file
}

const FILE_CONFIG: &str = r#"
[credentials]
client_id = "file-client"
client_secret = "file-secret"
refresh_token = "file-refresh"
developer_token = "file-dev"
customer_id = "100"
account_id = "200"

[endpoints]
token_url = "http://localhost:1/token"

[poll]
interval_ms = 250
max_attempts = 4
"#;

#[test]
fn from_file_reads_every_table() {
    let file = write_config(FILE_CONFIG);
    let config = ReportingConfig::from_file(file.path()).expect("config");

    assert_eq!(config.credentials.client_id.as_deref(), Some("file-client"));
    assert_eq!(config.credentials.account_id.as_deref(), Some("200"));
    assert!(config.credentials.missing().is_empty());
    assert_eq!(config.endpoints.token_url, "http://localhost:1/token");
    assert_eq!(config.endpoints.reporting_url, DEFAULT_REPORTING_URL);
    assert_eq!(config.poll.max_attempts, 4);
    assert_eq!(
        config.poll_policy().interval,
        std::time::Duration::from_millis(250)
    );
}

#[test]
fn from_file_rejects_malformed_toml() {
    let file = write_config("[credentials\nclient_id = ");
    let err = ReportingConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ReportError::InvalidArgument(_)), "{err:?}");
}

#[test]
fn from_file_missing_path_is_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = ReportingConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ReportError::Io(_)), "{err:?}");
}

#[test]
fn load_layers_env_over_file() {
    let (_lock, _guard) = clean_env();
    std::env::set_var("MSADS_DEVELOPER_TOKEN", "env-dev");
    std::env::set_var("MSADS_REPORTING_URL", "http://localhost:2/reporting");

    let file = write_config(FILE_CONFIG);
    let config = ReportingConfig::load(Some(file.path())).expect("config");

    assert_eq!(config.credentials.developer_token.as_deref(), Some("env-dev"));
    assert_eq!(config.credentials.client_id.as_deref(), Some("file-client"));
    assert_eq!(config.endpoints.reporting_url, "http://localhost:2/reporting");
    assert_eq!(config.endpoints.token_url, "http://localhost:1/token");
}

#[test]
fn blank_env_values_do_not_override_file() {
    let (_lock, _guard) = clean_env();
    std::env::set_var("MSADS_CUSTOMER_ID", "   ");

    let file = write_config(FILE_CONFIG);
    let config = ReportingConfig::load(Some(file.path())).expect("config");
    assert_eq!(config.credentials.customer_id.as_deref(), Some("100"));
}

#[test]
fn from_env_reads_msads_variables() {
    let (_lock, _guard) = clean_env();
    std::env::set_var("MSADS_CLIENT_ID", "env-client");
    std::env::set_var("MSADS_ACCOUNT_ID", "42");

    let config = ReportingConfig::from_env();
    assert_eq!(config.credentials.client_id.as_deref(), Some("env-client"));
    assert_eq!(config.credentials.account_id.as_deref(), Some("42"));
    assert!(config.credentials.missing().contains(&"developer_token"));
}

#[test]
fn debug_output_redacts_secrets() {
    let file = write_config(FILE_CONFIG);
    let config = ReportingConfig::from_file(file.path()).expect("config");
    let debug = format!("{config:?}");
    assert!(!debug.contains("file-secret"), "{debug}");
    assert!(!debug.contains("file-refresh"), "{debug}");
    assert!(!debug.contains("file-dev"), "{debug}");
}
