//! HTTP clients for the token service and the StudentVerification API.
//!
//! [`WrapTokenClient`] performs the OAuth WRAP credential exchange and
//! [`SvApiClient`] lists the corrections batched in a date range and downloads
//! each file into the target directory. Both implement the collaborator traits
//! consumed by [`crate::orchestrator::Orchestrator`].

mod corrections;
mod file_downloader;
mod sts;

// Re-export public API
pub use corrections::{
    corrections_url, document_url, parse_corrections, CorrectionDocument, SvApiClient,
};
pub use file_downloader::{
    commit_downloads, discard_downloads, safe_file_name, stage_download, StagedDownload,
};
pub use sts::{authorization_header, parse_wrap_response, WrapTokenClient};
