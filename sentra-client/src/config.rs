//! Client configuration.
//!
//! Loaded from JSON; every field has a default so a partial file is valid.
//!
//! ```json
//! {
//!   "license": { "authority_url": "https://license.example.com/api", "shared_key": "..." },
//!   "guard": { "interval_ms": 5000, "process_denylist": ["x64dbg"] },
//!   "webhook": { "url": "https://hooks.example.com/report", "token": "..." },
//!   "input": { "max_step_ms": 16 },
//!   "logging": { "filter": "info,sentra_guard=debug" }
//! }
//! ```

use crate::error::{ClientError, ClientResult};
use sentra_guard::{BatteryConfig, GuardConfig};
use sentra_input::StepConfig;
use sentra_license::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub license: LicenseSettings,
    pub guard: GuardSettings,
    pub webhook: WebhookSettings,
    pub input: InputSettings,
    pub logging: LoggingConfig,
    /// Plain-text announcement shown by the presentation layer.
    pub announcement_url: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseSettings {
    /// Base URL of the license authority.
    pub authority_url: String,
    /// Key material for the license codec.
    pub shared_key: String,
    pub request_timeout_ms: u64,
    pub expiry_check_interval_ms: u64,
}

impl Default for LicenseSettings {
    fn default() -> Self {
        Self {
            authority_url: "http://127.0.0.1:8080".to_string(),
            shared_key: String::new(),
            request_timeout_ms: 10_000,
            expiry_check_interval_ms: 1_000,
        }
    }
}

impl fmt::Debug for LicenseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseSettings")
            .field("authority_url", &self.authority_url)
            .field("shared_key", &"<redacted>")
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("expiry_check_interval_ms", &self.expiry_check_interval_ms)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardSettings {
    pub interval_ms: u64,
    pub check_timeout_ms: u64,
    pub escalation_threshold: usize,
    pub escalation_window_ms: u64,
    pub timing_probe_max_us: u64,
    pub clock_drift_tolerance_ms: u64,
    /// Case-insensitive fragments of module names that must not be loaded.
    pub module_denylist: Vec<String>,
    /// Case-insensitive fragments of process names that must not run.
    pub process_denylist: Vec<String>,
    /// Known-good hex SHA-256 of the binary. Absent: first digest wins.
    pub expected_digest: Option<String>,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            check_timeout_ms: 2_000,
            escalation_threshold: 3,
            escalation_window_ms: 60_000,
            timing_probe_max_us: 50_000,
            clock_drift_tolerance_ms: 2_000,
            module_denylist: Vec::new(),
            process_denylist: Vec::new(),
            expected_digest: None,
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    /// Report endpoint. Without one, threats are only logged.
    pub url: Option<String>,
    /// Sent as the `token` query parameter.
    pub token: Option<String>,
    pub timeout_ms: u64,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_ms: 5_000,
        }
    }
}

impl fmt::Debug for WebhookSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSettings")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub min_step_ms: u64,
    pub max_step_ms: u64,
    pub max_steps: usize,
    pub poll_interval_ms: u64,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            min_step_ms: 8,
            max_step_ms: 16,
            max_steps: 500,
            poll_interval_ms: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> ClientResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// `<config dir>/sentra/config.json`, when the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sentra").join("config.json"))
    }

    /// Loads `path`, or returns the defaults if it does not exist.
    ///
    /// The defaults have no shared key and are not validated; callers that
    /// log in must supply one.
    pub fn load_or_default(path: impl AsRef<Path>) -> ClientResult<Self> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(json) => Self::from_json_str(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> ClientResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.license.shared_key.is_empty() {
            return Err(ClientError::Config("license.shared_key must be set".into()));
        }
        if self.license.authority_url.trim().is_empty() {
            return Err(ClientError::Config(
                "license.authority_url must be set".into(),
            ));
        }
        let intervals = [
            ("license.request_timeout_ms", self.license.request_timeout_ms),
            (
                "license.expiry_check_interval_ms",
                self.license.expiry_check_interval_ms,
            ),
            ("guard.interval_ms", self.guard.interval_ms),
            ("guard.check_timeout_ms", self.guard.check_timeout_ms),
            ("guard.escalation_window_ms", self.guard.escalation_window_ms),
            ("webhook.timeout_ms", self.webhook.timeout_ms),
            ("input.max_step_ms", self.input.max_step_ms),
            ("input.poll_interval_ms", self.input.poll_interval_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, v)| *v == 0) {
            return Err(ClientError::Config(format!("{name} must be greater than 0")));
        }
        if self.input.min_step_ms > self.input.max_step_ms {
            return Err(ClientError::Config(
                "input.min_step_ms must not exceed input.max_step_ms".into(),
            ));
        }
        if self.input.max_steps == 0 {
            return Err(ClientError::Config(
                "input.max_steps must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            request_timeout: Duration::from_millis(self.license.request_timeout_ms),
            expiry_check_interval: Duration::from_millis(self.license.expiry_check_interval_ms),
        }
    }

    pub fn guard_config(&self) -> GuardConfig {
        GuardConfig {
            interval: Duration::from_millis(self.guard.interval_ms),
            check_timeout: Duration::from_millis(self.guard.check_timeout_ms),
            escalation_threshold: self.guard.escalation_threshold,
            escalation_window: Duration::from_millis(self.guard.escalation_window_ms),
        }
    }

    pub fn battery_config(&self) -> BatteryConfig {
        BatteryConfig {
            timing_probe_max: Duration::from_micros(self.guard.timing_probe_max_us),
            clock_drift_tolerance: Duration::from_millis(self.guard.clock_drift_tolerance_ms),
            module_denylist: self.guard.module_denylist.clone(),
            process_denylist: self.guard.process_denylist.clone(),
            expected_digest: self.guard.expected_digest.clone(),
        }
    }

    pub fn step_config(&self) -> StepConfig {
        StepConfig {
            min_step: Duration::from_millis(self.input.min_step_ms),
            max_step: Duration::from_millis(self.input.max_step_ms),
            max_steps: self.input.max_steps,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.input.poll_interval_ms)
    }
}
