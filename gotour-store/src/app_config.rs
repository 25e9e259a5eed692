use gotour_core::Locale;
use reqwest::Url;
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub sepay: SePayConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 10 }

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Bearer token to start the session with
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_poll_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_interval_ms() -> u64 { 5_000 }
fn default_poll_timeout_secs() -> u64 { 600 }

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.interval_ms == 0 {
            return Err(config::ConfigError::Message("polling.interval_ms must be greater than 0".into()));
        }
        if self.timeout_secs == 0 {
            return Err(config::ConfigError::Message("polling.timeout_secs must be greater than 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SePayConfig {
    pub qr_base_url: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub bank: String,
}

impl Default for SePayConfig {
    fn default() -> Self {
        Self {
            qr_base_url: "https://qr.sepay.vn/img".to_string(),
            account_number: String::new(),
            bank: String::new(),
        }
    }
}

impl SePayConfig {
    /// QR image URL for a transfer, or `None` without a receiving account.
    ///
    /// Format: `{base}?acc={account}&bank={bank}&amount={amount}&des={reference}`
    pub fn qr_url(&self, amount: f64, reference: &str) -> Option<String> {
        if self.account_number.is_empty() || self.bank.is_empty() {
            return None;
        }
        let amount = (amount.round() as u64).to_string();
        let params = [
            ("acc", self.account_number.as_str()),
            ("bank", self.bank.as_str()),
            ("amount", amount.as_str()),
            ("des", reference),
        ];
        match Url::parse_with_params(self.qr_base_url.trim_end_matches('/'), &params) {
            Ok(url) => Some(url.into()),
            Err(e) => {
                warn!("Invalid SePay QR base URL {}: {}", self.qr_base_url, e);
                None
            }
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub locale: Locale,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `GOTOUR__API__BASE_URL=https://api.gotour.vn`
            .add_source(config::Environment::with_prefix("GOTOUR").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Build from an inline TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        self.polling.validate()
    }
}
