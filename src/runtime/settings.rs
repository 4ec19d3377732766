//! Runtime configuration loaded from the environment.

use miette::Diagnostic;
use thiserror::Error;
use tracing::warn;

/// Bounds for the validation retry ceiling.
const MAX_RETRIES_RANGE: std::ops::RangeInclusive<u32> = 1..=10;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// A malformed environment value. Absent variables fall back to defaults;
/// present-but-unparseable ones are configuration errors.
#[derive(Debug, Error, Diagnostic)]
#[error("invalid value for {key}: {value}")]
#[diagnostic(code(docsmith::runtime::settings), help("unset the variable to use the default"))]
pub struct SettingsError {
    pub key: &'static str,
    pub value: String,
}

/// Run-wide configuration.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Ceiling on validation retries; analysis runs at most this many times
    /// plus one.
    pub max_retries: u32,
    /// Default for the per-run diagrams flag.
    pub enable_diagrams: bool,
    /// Model identifier handed to the model provider.
    pub model_name: String,
    /// Credential for the change host, when publishing.
    pub host_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_retries: DEFAULT_MAX_RETRIES,
            enable_diagrams: true,
            model_name: "gemini-2.0-flash".to_string(),
            host_token: None,
        }
    }
}

impl Settings {
    /// Loads settings from the environment, reading a `.env` file first if
    /// one exists. `DOCSMITH_MAX_RETRIES` outside `[1, 10]` is clamped with a
    /// warning rather than rejected.
    pub fn from_env() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        let mut settings = Settings::default();

        if let Ok(raw) = std::env::var("DOCSMITH_MAX_RETRIES") {
            let parsed: u32 = raw.parse().map_err(|_| SettingsError {
                key: "DOCSMITH_MAX_RETRIES",
                value: raw.clone(),
            })?;
            settings.max_retries = Self::clamp_max_retries(parsed);
        }
        if let Ok(raw) = std::env::var("DOCSMITH_ENABLE_DIAGRAMS") {
            settings.enable_diagrams = match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(SettingsError {
                        key: "DOCSMITH_ENABLE_DIAGRAMS",
                        value: raw,
                    });
                }
            };
        }
        if let Ok(raw) = std::env::var("DOCSMITH_MODEL") {
            settings.model_name = raw;
        }
        if let Ok(raw) = std::env::var("DOCSMITH_HOST_TOKEN") {
            settings.host_token = Some(raw);
        }

        Ok(settings)
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Self::clamp_max_retries(max_retries);
        self
    }

    fn clamp_max_retries(value: u32) -> u32 {
        if MAX_RETRIES_RANGE.contains(&value) {
            value
        } else {
            let clamped = value.clamp(*MAX_RETRIES_RANGE.start(), *MAX_RETRIES_RANGE.end());
            warn!(requested = value, clamped, "max_retries out of range, clamping");
            clamped
        }
    }
}
