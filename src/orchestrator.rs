//! Sequences one retrieval run.
//!
//! A run walks `Validating → Authenticating → Fetching → Reporting` and ends
//! in [`RunResult::Success`] or [`RunResult::Failed`]. Each step either
//! advances or stops the run; nothing is retried. On failure the log handle
//! is flushed before the result is returned, so the caller can exit right
//! away.

use crate::config::WrapRequest;
use crate::constants::{INVALID_DATES_MESSAGE, NO_CORRECTIONS_MESSAGE};
use crate::dates::{format_date, parse_range};
use crate::errors::{AppError, AppResult};
use crate::logging::LogHandle;
use crate::models::{AuthorizationToken, CorrectionFile, DateRange, RunResult, RunStage};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Issues authorization tokens.
#[async_trait]
pub trait TokenService: Send + Sync {
    async fn authorization(&self, request: &WrapRequest) -> AppResult<AuthorizationToken>;
}

/// Arguments of one corrections fetch.
#[derive(Debug, Clone)]
pub struct CorrectionsQuery {
    pub root_url: String,
    pub token: AuthorizationToken,
    /// Start date in `MM-DD-YYYY` form
    pub start: String,
    /// End date in `MM-DD-YYYY` form
    pub end: String,
    pub target_dir: PathBuf,
}

/// Retrieves the correction files for a query into its target directory.
#[async_trait]
pub trait CorrectionsSource: Send + Sync {
    async fn corrections(&self, query: &CorrectionsQuery) -> AppResult<Vec<CorrectionFile>>;
}

type StageResult<T> = Result<T, (RunStage, AppError)>;

/// Runs one retrieval against a token service and a corrections source.
///
/// The collaborators and the log handle are injected, so tests can drive a
/// run with in-memory doubles.
pub struct Orchestrator<T, C> {
    wrap_request: WrapRequest,
    root_url: String,
    tokens: T,
    source: C,
    log: LogHandle,
}

impl<T, C> Orchestrator<T, C>
where
    T: TokenService,
    C: CorrectionsSource,
{
    pub fn new(
        wrap_request: WrapRequest,
        root_url: impl Into<String>,
        tokens: T,
        source: C,
        log: LogHandle,
    ) -> Self {
        Self {
            wrap_request,
            root_url: root_url.into(),
            tokens,
            source,
            log,
        }
    }

    /// Runs the whole sequence for the raw date inputs.
    ///
    /// Never panics on bad input: validation, authentication and fetch
    /// failures are logged and returned as [`RunResult::Failed`] with the
    /// stage that stopped the run.
    pub async fn run(
        &self,
        start_raw: Option<&str>,
        end_raw: Option<&str>,
        target_dir: &Path,
    ) -> RunResult {
        match self.execute(start_raw, end_raw, target_dir).await {
            Ok(files) => RunResult::Success { files },
            Err((stage, error)) => {
                debug!(stage = stage.display_name(), "Run failed");
                if let Err(e) = self.log.flush() {
                    eprintln!("{e}");
                }
                RunResult::Failed { stage, error }
            }
        }
    }

    async fn execute(
        &self,
        start_raw: Option<&str>,
        end_raw: Option<&str>,
        target_dir: &Path,
    ) -> StageResult<Vec<CorrectionFile>> {
        enter(RunStage::Validating);
        let range = self.check_inputs(start_raw, end_raw, target_dir).await?;

        enter(RunStage::Authenticating);
        let token = self.authenticate().await?;

        enter(RunStage::Fetching);
        let files = self.fetch(range, token, target_dir).await?;

        enter(RunStage::Reporting);
        report(&files);
        Ok(files)
    }

    /// Checks the target directory, then parses the date range.
    async fn check_inputs(
        &self,
        start_raw: Option<&str>,
        end_raw: Option<&str>,
        target_dir: &Path,
    ) -> StageResult<DateRange> {
        let is_dir = tokio::fs::metadata(target_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            error!(target_dir = %target_dir.display(), "Output directory does not exist.");
            return Err((
                RunStage::Validating,
                AppError::Validation(format!(
                    "output directory {} does not exist",
                    target_dir.display()
                )),
            ));
        }

        parse_range(start_raw, end_raw).map_err(|e| {
            error!(error = %e, "{INVALID_DATES_MESSAGE}");
            (RunStage::Validating, e)
        })
    }

    async fn authenticate(&self) -> StageResult<AuthorizationToken> {
        self.tokens
            .authorization(&self.wrap_request)
            .await
            .map_err(|e| {
                error!(error = %e, "Error retrieving authorization");
                (RunStage::Authenticating, e)
            })
    }

    async fn fetch(
        &self,
        range: DateRange,
        token: AuthorizationToken,
        target_dir: &Path,
    ) -> StageResult<Vec<CorrectionFile>> {
        let query = CorrectionsQuery {
            root_url: self.root_url.clone(),
            token,
            start: format_date(range.start()),
            end: format_date(range.end()),
            target_dir: target_dir.to_path_buf(),
        };

        self.source.corrections(&query).await.map_err(|e| {
            error!(error = %e, "Error retrieving ISIR corrections");
            (RunStage::Fetching, e)
        })
    }
}

fn enter(stage: RunStage) {
    debug!(stage = stage.display_name(), "Entering stage");
}

fn report(files: &[CorrectionFile]) {
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    debug!(files = ?names, "Retrieved files");

    if files.is_empty() {
        info!("{NO_CORRECTIONS_MESSAGE}");
        return;
    }

    info!(
        "{} ISIR correction files were successfully retrieved.",
        files.len()
    );
    for file in files {
        info!(path = %file.path.display(), "File Name: {}", file.name);
    }
}
