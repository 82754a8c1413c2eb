//! Configuration system (layered: env > config file).
//!
//! [`ReportingConfig::load`] resolves every field in this order, later
//! sources winning:
//! 1. `config.toml` in the platform config directory, or an explicit path
//! 2. `MSADS_*` environment variables (a `.env` file is loaded first when present)
//!
//! [`ReportingConfig::apply_vars`] overwrites fields that are already set, so
//! to pin a value in code assign it after loading.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bon::Builder;
use serde::Deserialize;

use crate::error::{ReportError, Result};
use crate::util::poll::PollPolicy;

pub const DEFAULT_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";
pub const DEFAULT_REPORTING_URL: &str =
    "https://reporting.api.bingads.microsoft.com/Reporting/v13/ReportingService.svc";
pub const DEFAULT_SCOPE: &str = "https://ads.microsoft.com/msads.manage offline_access";

/// Microsoft Advertising account credentials.
///
/// Every field is required before a report can be fetched; use
/// [`Credentials::require`] to check.
#[derive(Clone, Default, Builder, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Credentials {
    #[builder(into)]
    pub client_id: Option<String>,
    #[builder(into)]
    pub client_secret: Option<String>,
    #[builder(into)]
    pub refresh_token: Option<String>,
    #[builder(into)]
    pub developer_token: Option<String>,
    #[builder(into)]
    pub customer_id: Option<String>,
    #[builder(into)]
    pub account_id: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "..");
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("developer_token", &redact(&self.developer_token))
            .field("customer_id", &self.customer_id)
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Credentials with every field present.
#[derive(Clone)]
pub struct CredentialSet {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub developer_token: String,
    pub customer_id: String,
    pub account_id: String,
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("client_id", &self.client_id)
            .field("client_secret", &"..")
            .field("refresh_token", &"..")
            .field("developer_token", &"..")
            .field("customer_id", &self.customer_id)
            .field("account_id", &self.account_id)
            .finish()
    }
}

impl Credentials {
    /// Names of fields that are unset or blank.
    pub fn missing(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| name)
            .collect()
    }

    /// Resolve to a complete [`CredentialSet`] or fail with
    /// [`ReportError::NotConfigured`].
    pub fn require(&self) -> Result<CredentialSet> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(ReportError::NotConfigured { missing });
        }
        let get = |v: &Option<String>| v.clone().unwrap_or_default();
        Ok(CredentialSet {
            client_id: get(&self.client_id),
            client_secret: get(&self.client_secret),
            refresh_token: get(&self.refresh_token),
            developer_token: get(&self.developer_token),
            customer_id: get(&self.customer_id),
            account_id: get(&self.account_id),
        })
    }

    /// Fill every unset field from `other`.
    pub fn or(mut self, other: Credentials) -> Self {
        self.client_id = self.client_id.or(other.client_id);
        self.client_secret = self.client_secret.or(other.client_secret);
        self.refresh_token = self.refresh_token.or(other.refresh_token);
        self.developer_token = self.developer_token.or(other.developer_token);
        self.customer_id = self.customer_id.or(other.customer_id);
        self.account_id = self.account_id.or(other.account_id);
        self
    }

    fn fields(&self) -> [(&'static str, Option<&str>); 6] {
        [
            ("client_id", self.client_id.as_deref()),
            ("client_secret", self.client_secret.as_deref()),
            ("refresh_token", self.refresh_token.as_deref()),
            ("developer_token", self.developer_token.as_deref()),
            ("customer_id", self.customer_id.as_deref()),
            ("account_id", self.account_id.as_deref()),
        ]
    }
}

/// Remote endpoints. Overridable so tests can point at a mock server.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub token_url: String,
    pub reporting_url: String,
    pub scope: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            reporting_url: DEFAULT_REPORTING_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }
}

/// `[poll]` table of the config file.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollSettings {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            interval_ms: policy.interval.as_millis() as u64,
            max_attempts: policy.max_attempts,
        }
    }
}

impl From<PollSettings> for PollPolicy {
    fn from(settings: PollSettings) -> Self {
        Self {
            interval: Duration::from_millis(settings.interval_ms),
            max_attempts: settings.max_attempts,
        }
    }
}

/// Complete configuration for a [`ReportFetcher`](crate::report::ReportFetcher).
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportingConfig {
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    pub poll: PollSettings,
}

const ENV_CLIENT_ID: &str = "MSADS_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "MSADS_CLIENT_SECRET";
const ENV_REFRESH_TOKEN: &str = "MSADS_REFRESH_TOKEN";
const ENV_DEVELOPER_TOKEN: &str = "MSADS_DEVELOPER_TOKEN";
const ENV_CUSTOMER_ID: &str = "MSADS_CUSTOMER_ID";
const ENV_ACCOUNT_ID: &str = "MSADS_ACCOUNT_ID";
const ENV_TOKEN_URL: &str = "MSADS_TOKEN_URL";
const ENV_REPORTING_URL: &str = "MSADS_REPORTING_URL";

impl ReportingConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            ..Self::default()
        }
    }

    /// Load from environment variables only.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();
        config.apply_vars(|key| std::env::var(key).ok());
        config
    }

    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text).map_err(|e| {
            ReportError::InvalidArgument(format!("{}: {e}", path.display()))
        })
    }

    /// Parse TOML text.
    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Layer env vars over a config file.
    ///
    /// With `path == None` the default file is used when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.is_file() => Self::from_file(default)?,
                _ => Self::default(),
            },
        };
        config.apply_vars(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// `<platform config dir>/adreport/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "adreport")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Override fields from a variable lookup (non-blank values only).
    ///
    /// Values already present, whether from a file or set in code, are replaced.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let env_credentials = Credentials {
            client_id: get(ENV_CLIENT_ID),
            client_secret: get(ENV_CLIENT_SECRET),
            refresh_token: get(ENV_REFRESH_TOKEN),
            developer_token: get(ENV_DEVELOPER_TOKEN),
            customer_id: get(ENV_CUSTOMER_ID),
            account_id: get(ENV_ACCOUNT_ID),
        };
        self.credentials = env_credentials.or(std::mem::take(&mut self.credentials));

        if let Some(url) = get(ENV_TOKEN_URL) {
            self.endpoints.token_url = url;
        }
        if let Some(url) = get(ENV_REPORTING_URL) {
            self.endpoints.reporting_url = url;
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll.into()
    }
}
