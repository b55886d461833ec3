use crate::errors::AppError;
use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;

/// Inclusive range of calendar dates with `start <= end`.
///
/// Only built through [`crate::dates::parse_range`], so holding one means the
/// boundaries were already validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub(crate) fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Value of the `Authorization` header issued by the token service.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationToken(String);

impl AuthorizationToken {
    pub fn new(header_value: impl Into<String>) -> Self {
        Self(header_value.into())
    }

    pub fn header_value(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthorizationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthorizationToken(<redacted>)")
    }
}

/// A correction file retrieved from the StudentVerification API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionFile {
    pub name: String,
    /// Where the file was written inside the target directory
    pub path: PathBuf,
}

/// Orchestrator states, in the order a run walks through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Validating,
    Authenticating,
    Fetching,
    Reporting,
}

impl RunStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Authenticating => "authenticating",
            Self::Fetching => "fetching",
            Self::Reporting => "reporting",
        }
    }
}

/// Terminal outcome of one invocation.
#[derive(Debug)]
pub enum RunResult {
    Success { files: Vec<CorrectionFile> },
    Failed { stage: RunStage, error: AppError },
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Process exit code: 0 on success, 1 on any failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Success { .. } => 0,
            Self::Failed { .. } => 1,
        }
    }
}
