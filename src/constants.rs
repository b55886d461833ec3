// Configuration
pub const DEFAULT_CONFIG_PATH: &str = "sv-isir-corrections.toml";
pub const DEFAULT_LOG_LEVEL: &str = "debug";

// Log files
pub const LOG_FILE_NAME: &str = "logs.log";
pub const ERROR_LOG_FILE_NAME: &str = "errors.log";
pub const DEFAULT_MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_LOG_FILES: usize = 5;

// Date formats
pub const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const WIRE_DATE_FORMAT: &str = "%m-%d-%Y";
pub const DATE_HELP_TEXT: &str = "Date in YYYY-MM-DD format, e.g., 2015-09-21";

// StudentVerification API
pub const CORRECTIONS_PATH: &str = "isirs/corrections";

// OAuth WRAP form fields
pub const WRAP_NAME: &str = "wrap_name";
pub const WRAP_PASSWORD: &str = "wrap_password";
pub const WRAP_SCOPE: &str = "wrap_scope";
pub const WRAP_ACCESS_TOKEN: &str = "wrap_access_token";

// Report messages
pub const NO_CORRECTIONS_MESSAGE: &str = "No ISIR corrections found.";
pub const INVALID_DATES_MESSAGE: &str = "Invalid date(s) detected.";
