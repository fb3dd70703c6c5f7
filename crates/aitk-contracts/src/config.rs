use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::errors::ToolError;

pub const DEFAULT_SECRETS_FILE: &str = "api_keys.env";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TEXT_MODEL: &str = "gpt-4-turbo";
const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
const DEFAULT_VISION_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretsFile {
    Loaded,
    Missing,
    /// Present but unreadable or malformed. Lines before the bad one are kept.
    Invalid(String),
}

/// Loads `key=value` lines into the process environment.
///
/// Variables that are already set keep their values, so repeated calls with the
/// same file are no-ops. Neither a missing nor a malformed file is fatal: both
/// are logged and reported back, and a tool only fails once it needs a key.
pub fn load_secrets_file(path: &Path) -> SecretsFile {
    match dotenvy::from_path(path) {
        Ok(()) => {
            debug!(path = %path.display(), "loaded secrets file");
            SecretsFile::Loaded
        }
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "secrets file not found; relying on environment");
            SecretsFile::Missing
        }
        Err(err) => {
            warn!(path = %path.display(), "ignoring unusable secrets file: {err}");
            SecretsFile::Invalid(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    openai: Option<SecretString>,
    gemini: Option<SecretString>,
}

impl Credentials {
    pub fn new(openai: Option<String>, gemini: Option<String>) -> Self {
        Self {
            openai: non_empty(openai).map(SecretString::new),
            gemini: non_empty(gemini).map(SecretString::new),
        }
    }

    pub fn from_env() -> Self {
        Self::new(env::var(OPENAI_API_KEY).ok(), env::var(GEMINI_API_KEY).ok())
    }

    pub fn has_openai(&self) -> bool {
        self.openai.is_some()
    }

    pub fn has_gemini(&self) -> bool {
        self.gemini.is_some()
    }

    pub fn openai_key(&self) -> Result<&str, ToolError> {
        self.openai
            .as_ref()
            .map(|secret| secret.expose_secret().as_str())
            .ok_or_else(|| missing_key(OPENAI_API_KEY))
    }

    pub fn gemini_key(&self) -> Result<&str, ToolError> {
        self.gemini
            .as_ref()
            .map(|secret| secret.expose_secret().as_str())
            .ok_or_else(|| missing_key(GEMINI_API_KEY))
    }
}

fn missing_key(name: &str) -> ToolError {
    ToolError::configuration(format!(
        "{name} is not set. Add it to {DEFAULT_SECRETS_FILE} or export it in the environment."
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolkitSettings {
    pub output_dir: PathBuf,
    pub public_dir: PathBuf,
    pub openai_api_base: String,
    pub gemini_api_base: String,
    pub text_model: String,
    pub image_model: String,
    pub vision_model: String,
    pub chrome_path: Option<PathBuf>,
    pub navigation_timeout: Duration,
}

impl Default for ToolkitSettings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ToolkitSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| non_empty(lookup(key));
        Self {
            output_dir: get("AITK_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            public_dir: get("AITK_PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            openai_api_base: get("OPENAI_API_BASE")
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string()),
            gemini_api_base: get("GEMINI_API_BASE")
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            text_model: get("AITK_TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: get("AITK_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            vision_model: get("AITK_VISION_MODEL")
                .unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string()),
            chrome_path: get("AITK_CHROME").or_else(|| get("CHROME_PATH")).map(PathBuf::from),
            navigation_timeout: get("AITK_NAV_TIMEOUT_SECS")
                .and_then(|raw| raw.parse::<u64>().ok())
                .map(|secs| secs.clamp(5, 300))
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(DEFAULT_NAVIGATION_TIMEOUT_SECS)),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
