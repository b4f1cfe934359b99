//! Layered configuration for the wizard engine.
//!
//! Precedence, later layers override earlier ones:
//! 1. Defaults ([`WizardConfig::default`])
//! 2. `config.toml` in the stockflow home (`$STOCKFLOW_HOME`, else `~/.stockflow`)
//! 3. `STOCKFLOW_*` environment variables
//!
//! ```no_run
//! use stockflow_wizard::ConfigLoader;
//!
//! let config = ConfigLoader::new().load().expect("config");
//! println!("{}", config.base_url);
//! ```

use serde::Deserialize;
use serde::Serialize;
use std::env;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use stockflow_protocol::PACKING_NEXT_STATUS;
use stockflow_protocol::PACKING_STEP_NUMBER;
use thiserror::Error;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_ENV_PREFIX: &str = "STOCKFLOW";

/// What to do with a save/advance issued while another one is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitPolicy {
    /// Fail fast with `StepError::Busy`.
    #[default]
    Reject,
    /// Let both run; the request issued last wins.
    Allow,
}

impl FromStr for SubmitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "allow" => Ok(Self::Allow),
            other => Err(format!("unknown submit policy '{other}'")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("I/O error loading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for ${var}: '{value}' (expected: {expected})")]
    InvalidEnvValue {
        var: String,
        value: String,
        expected: String,
    },

    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardConfig {
    /// API root, e.g. `http://localhost:8080/openboxes/api`.
    pub base_url: String,
    pub step_number: u32,
    /// Status the stock movement moves to when the step advances.
    pub next_status: String,
    pub request_timeout_secs: u64,
    pub submit_policy: SubmitPolicy,
    pub recipient_search_debounce_ms: u64,
    /// Queries shorter than this return no options without a request.
    pub recipient_search_min_chars: usize,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/openboxes/api".to_string(),
            step_number: PACKING_STEP_NUMBER,
            next_status: PACKING_NEXT_STATUS.to_string(),
            request_timeout_secs: 30,
            submit_policy: SubmitPolicy::Reject,
            recipient_search_debounce_ms: 500,
            recipient_search_min_chars: 1,
        }
    }
}

impl WizardConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn recipient_search_debounce(&self) -> Duration {
        Duration::from_millis(self.recipient_search_debounce_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigLoadError::Validation("base_url must not be empty".to_string()));
        }
        if self.step_number == 0 {
            return Err(ConfigLoadError::Validation("step_number starts at 1".to_string()));
        }
        if self.next_status.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "next_status must not be empty".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigLoadError::Validation(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// File layer; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    base_url: Option<String>,
    step_number: Option<u32>,
    next_status: Option<String>,
    request_timeout_secs: Option<u64>,
    submit_policy: Option<SubmitPolicy>,
    recipient_search_debounce_ms: Option<u64>,
    recipient_search_min_chars: Option<usize>,
}

/// Builder for layered configuration loading.
pub struct ConfigLoader {
    home: Option<PathBuf>,
    env_prefix: String,
    skip_file: bool,
    skip_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            home: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            skip_file: false,
            skip_env: false,
        }
    }

    /// Directory holding `config.toml`. Auto-detected when unset.
    pub fn with_home(mut self, path: PathBuf) -> Self {
        self.home = Some(path);
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn skip_file_layer(mut self) -> Self {
        self.skip_file = true;
        self
    }

    pub fn skip_env_layer(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Load with all enabled layers and validate the result.
    pub fn load(self) -> Result<WizardConfig, ConfigLoadError> {
        self.load_with_env(|key| env::var(key).ok())
    }

    /// Like [`load`](Self::load) with an injectable environment lookup.
    pub fn load_with_env(
        self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<WizardConfig, ConfigLoadError> {
        let mut config = WizardConfig::default();

        if !self.skip_file {
            let home = match self.home.clone() {
                Some(home) => home,
                None => resolve_home(&lookup)?,
            };
            merge_file(&mut config, load_from_file(&home)?);
        }

        if !self.skip_env {
            apply_env_overrides(&mut config, &self.env_prefix, &lookup)?;
        }

        config.validate()?;
        Ok(config)
    }
}

/// `$STOCKFLOW_HOME`, else `~/.stockflow`.
fn resolve_home(lookup: &impl Fn(&str) -> Option<String>) -> Result<PathBuf, ConfigLoadError> {
    if let Some(path) = lookup("STOCKFLOW_HOME") {
        return Ok(PathBuf::from(path));
    }
    dirs::home_dir()
        .map(|home| home.join(".stockflow"))
        .ok_or_else(|| ConfigLoadError::Validation("Cannot determine home directory".to_string()))
}

fn load_from_file(home: &Path) -> Result<FileConfig, ConfigLoadError> {
    let path = home.join(CONFIG_FILE);
    let contents = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("{} not found, using defaults", path.display());
            return Ok(FileConfig::default());
        }
        Err(e) => return Err(ConfigLoadError::Io(e)),
    };
    Ok(toml::from_str(&contents)?)
}

fn merge_file(config: &mut WizardConfig, file: FileConfig) {
    if let Some(v) = file.base_url {
        config.base_url = v;
    }
    if let Some(v) = file.step_number {
        config.step_number = v;
    }
    if let Some(v) = file.next_status {
        config.next_status = v;
    }
    if let Some(v) = file.request_timeout_secs {
        config.request_timeout_secs = v;
    }
    if let Some(v) = file.submit_policy {
        config.submit_policy = v;
    }
    if let Some(v) = file.recipient_search_debounce_ms {
        config.recipient_search_debounce_ms = v;
    }
    if let Some(v) = file.recipient_search_min_chars {
        config.recipient_search_min_chars = v;
    }
}

fn parse_env<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    expected: &str,
) -> Result<Option<T>, ConfigLoadError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigLoadError::InvalidEnvValue {
            var: var.to_string(),
            value,
            expected: expected.to_string(),
        })
}

fn apply_env_overrides(
    config: &mut WizardConfig,
    prefix: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigLoadError> {
    if let Some(v) = lookup(&format!("{prefix}_BASE_URL")) {
        config.base_url = v;
    }
    if let Some(v) = parse_env(lookup, &format!("{prefix}_STEP_NUMBER"), "positive integer")? {
        config.step_number = v;
    }
    if let Some(v) = lookup(&format!("{prefix}_NEXT_STATUS")) {
        config.next_status = v;
    }
    if let Some(v) = parse_env(
        lookup,
        &format!("{prefix}_REQUEST_TIMEOUT_SECS"),
        "seconds as integer",
    )? {
        config.request_timeout_secs = v;
    }
    if let Some(v) = parse_env(lookup, &format!("{prefix}_SUBMIT_POLICY"), "reject or allow")? {
        config.submit_policy = v;
    }
    if let Some(v) = parse_env(
        lookup,
        &format!("{prefix}_RECIPIENT_DEBOUNCE_MS"),
        "milliseconds as integer",
    )? {
        config.recipient_search_debounce_ms = v;
    }
    if let Some(v) = parse_env(
        lookup,
        &format!("{prefix}_RECIPIENT_MIN_CHARS"),
        "integer",
    )? {
        config.recipient_search_min_chars = v;
    }
    Ok(())
}
