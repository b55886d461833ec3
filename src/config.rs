use crate::constants::{DEFAULT_LOG_LEVEL, DEFAULT_MAX_LOG_FILES, DEFAULT_MAX_LOG_FILE_SIZE};
use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Logging sinks and rotation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Directory receiving `logs.log` and `errors.log`; created on startup
    pub directory: PathBuf,
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    /// Size in bytes at which the log file is rotated
    pub max_file_size: u64,
    /// Number of rotated log files kept next to the active one
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./logs"),
            level: DEFAULT_LOG_LEVEL.to_string(),
            max_file_size: DEFAULT_MAX_LOG_FILE_SIZE,
            max_files: DEFAULT_MAX_LOG_FILES,
        }
    }
}

/// Credentials exchanged with the token service.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub uid: String,
    pub pwd: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("uid", &self.uid)
            .field("pwd", &"<redacted>")
            .finish()
    }
}

/// OAuth WRAP token request parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WrapRequest {
    /// Token service URL
    pub url: String,
    pub creds: Credentials,
    /// Resource the issued token grants access to
    pub wrap_scope: String,
}

/// StudentVerification API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SvApiConfig {
    pub root_url: String,
}

/// Configuration loaded from a TOML file.
///
/// Key names follow the historical JSON configuration (`oauthWrapRequest`,
/// `svApi.rootUrl`, `targetDir`). Unknown keys are rejected to catch typos.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    pub oauth_wrap_request: WrapRequest,
    pub sv_api: SvApiConfig,
    /// Directory receiving the correction files; `--output-dir` overrides it
    #[serde(default)]
    pub target_dir: Option<PathBuf>,
}

impl Config {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `Config` if the TOML is
    /// malformed, required fields are missing, unknown keys are present, a URL
    /// is not absolute http(s), a credential is empty or a rotation limit is 0.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| AppError::Io(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> AppResult<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        require_http_url("oauthWrapRequest.url", &self.oauth_wrap_request.url)?;
        require_http_url("svApi.rootUrl", &self.sv_api.root_url)?;
        require_non_empty("oauthWrapRequest.creds.uid", &self.oauth_wrap_request.creds.uid)?;
        require_non_empty("oauthWrapRequest.creds.pwd", &self.oauth_wrap_request.creds.pwd)?;
        require_non_empty("oauthWrapRequest.wrapScope", &self.oauth_wrap_request.wrap_scope)?;

        if self.logging.max_file_size == 0 {
            return Err(AppError::Config(
                "logging.max_file_size must be greater than 0".into(),
            ));
        }
        if self.logging.max_files == 0 {
            return Err(AppError::Config(
                "logging.max_files must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Picks the command-line override first, then `targetDir`.
    pub fn resolve_target_dir(&self, override_dir: Option<&Path>) -> AppResult<PathBuf> {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.target_dir.clone())
            .ok_or_else(|| {
                AppError::Config(
                    "No target directory: set targetDir or pass --output-dir".to_string(),
                )
            })
    }
}

fn require_http_url(key: &str, value: &str) -> AppResult<()> {
    let url =
        Url::parse(value).map_err(|e| AppError::Config(format!("{key} is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AppError::Config(format!(
            "{key} must use http or https, got '{other}'"
        ))),
    }
}

fn require_non_empty(key: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Config(format!("{key} must not be empty")));
    }
    Ok(())
}
