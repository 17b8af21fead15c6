//! Configuration module for the dataplane harness
//!
//! Two sources feed a test session:
//!
//! - [`TestEnv`]: required values read from the process environment
//!   (media location, region, stack name, AWS credentials).
//! - [`HarnessSettings`]: optional YAML file with environment variable
//!   expansion, carrying the literals the client and uploader send.

use serde::{Deserialize, Serialize};
use std::env::VarError;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

mod loader;

pub use loader::SettingsLoader;

/// Directory (with trailing separator) holding the sample media
pub const TEST_MEDIA_PATH: &str = "TEST_MEDIA_PATH";
/// File name of the sample image inside [`TEST_MEDIA_PATH`]
pub const SAMPLE_IMAGE: &str = "SAMPLE_IMAGE";
/// AWS region of the deployment under test
pub const REGION: &str = "REGION";
/// Name of the primary CloudFormation stack
pub const MI_STACK_NAME: &str = "MI_STACK_NAME";
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Only set when running with temporary STS credentials
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

// ============================================================================
// Environment Variable Expansion
// ============================================================================

fn env_var_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}")
            .expect("env var pattern is a valid regex")
    })
}

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
fn expand_env_vars(s: &str) -> String {
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in env_var_pattern().captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Leave the placeholder as written.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);
    result
}

/// Serde hook expanding `${VAR}` placeholders in string settings.
fn deserialize_with_env<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(expand_env_vars(&s))
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable for testing: {0}")]
    MissingVariable(&'static str),

    #[error("Environment variable {0} is set but not valid unicode")]
    InvalidVariable(&'static str),

    #[error("Failed to read settings file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// ============================================================================
// Test Environment
// ============================================================================

/// Values every test session needs from the process environment.
///
/// Built once per session and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct TestEnv {
    pub media_path: String,
    pub sample_image: String,
    pub region: String,
    pub stack_name: String,
    pub access_key: String,
    pub secret_key: String,
    pub session_token: Option<String>,
}

impl TestEnv {
    /// Load from the process environment.
    ///
    /// A variable that is set but not valid unicode is reported as
    /// [`ConfigError::InvalidVariable`] rather than as missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_var_lookup(|name| std::env::var(name))
    }

    /// Load from an arbitrary key lookup.
    ///
    /// Fails on the first absent required key, before any network activity.
    /// An empty `AWS_SESSION_TOKEN` counts as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_var_lookup(|name| lookup(name).ok_or(VarError::NotPresent))
    }

    fn from_var_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        tracing::debug!("Reading test environment variables");

        let required = |name: &'static str| match lookup(name) {
            Ok(value) => Ok(value),
            Err(VarError::NotPresent) => {
                tracing::error!(variable = name, "Missing a required environment variable");
                Err(ConfigError::MissingVariable(name))
            }
            Err(VarError::NotUnicode(_)) => {
                tracing::error!(variable = name, "Environment variable is not valid unicode");
                Err(ConfigError::InvalidVariable(name))
            }
        };

        let optional = |name: &'static str| match lookup(name) {
            Ok(value) if !value.is_empty() => Ok(Some(value)),
            Ok(_) | Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(ConfigError::InvalidVariable(name)),
        };

        let env = Self {
            media_path: required(TEST_MEDIA_PATH)?,
            sample_image: required(SAMPLE_IMAGE)?,
            region: required(REGION)?,
            stack_name: required(MI_STACK_NAME)?,
            access_key: required(AWS_ACCESS_KEY_ID)?,
            secret_key: required(AWS_SECRET_ACCESS_KEY)?,
            session_token: optional(AWS_SESSION_TOKEN)?,
        };

        Ok(env)
    }

    /// Local path of the sample media: media path and file name joined as-is
    pub fn sample_media_file(&self) -> String {
        format!("{}{}", self.media_path, self.sample_image)
    }

    /// Object key the sample media is uploaded under
    pub fn upload_key(&self, settings: &HarnessSettings) -> String {
        format!("{}{}", settings.upload_prefix, self.sample_image)
    }

    /// The environment as a name → value mapping, using the variable names.
    ///
    /// `AWS_SESSION_TOKEN` appears only when a token is set.
    pub fn to_map(&self) -> std::collections::BTreeMap<&'static str, &str> {
        let mut map = std::collections::BTreeMap::from([
            (TEST_MEDIA_PATH, self.media_path.as_str()),
            (SAMPLE_IMAGE, self.sample_image.as_str()),
            (REGION, self.region.as_str()),
            (MI_STACK_NAME, self.stack_name.as_str()),
            (AWS_ACCESS_KEY_ID, self.access_key.as_str()),
            (AWS_SECRET_ACCESS_KEY, self.secret_key.as_str()),
        ]);
        if let Some(token) = &self.session_token {
            map.insert(AWS_SESSION_TOKEN, token.as_str());
        }
        map
    }
}

impl fmt::Debug for TestEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestEnv")
            .field("media_path", &self.media_path)
            .field("sample_image", &self.sample_image)
            .field("region", &self.region)
            .field("stack_name", &self.stack_name)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ============================================================================
// Harness Settings
// ============================================================================

/// Literals sent by the client and uploader.
///
/// Defaults match the deployed dataplane; a YAML file may override them.
///
/// # Example
///
/// ```yaml
/// service_name: "execute-api"
/// lock_owner: "${LOCK_OWNER:-user01@example.com}"
/// media_type: "Image"
/// upload_prefix: "upload/"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessSettings {
    /// SigV4 signing service name. Default: "execute-api"
    #[serde(default = "default_service_name", deserialize_with = "deserialize_with_env")]
    pub service_name: String,

    /// Identity written as `LockedBy` on checkout. Default: "user01@example.com"
    #[serde(default = "default_lock_owner", deserialize_with = "deserialize_with_env")]
    pub lock_owner: String,

    /// `MediaType` of created assets. Default: "Image"
    #[serde(default = "default_media_type", deserialize_with = "deserialize_with_env")]
    pub media_type: String,

    /// Key prefix for uploaded media. Default: "upload/"
    #[serde(default = "default_upload_prefix", deserialize_with = "deserialize_with_env")]
    pub upload_prefix: String,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            lock_owner: default_lock_owner(),
            media_type: default_media_type(),
            upload_prefix: default_upload_prefix(),
        }
    }
}

impl HarnessSettings {
    /// Load settings from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        SettingsLoader::load(path)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("service_name", &self.service_name),
            ("lock_owner", &self.lock_owner),
            ("media_type", &self.media_type),
            ("upload_prefix", &self.upload_prefix),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "Setting '{}' cannot be empty",
                    name
                )));
            }
        }

        Ok(())
    }
}

fn default_service_name() -> String {
    "execute-api".to_string()
}

fn default_lock_owner() -> String {
    "user01@example.com".to_string()
}

fn default_media_type() -> String {
    "Image".to_string()
}

fn default_upload_prefix() -> String {
    "upload/".to_string()
}
