use crate::constants::CORRECTIONS_PATH;
use crate::errors::{AppError, AppResult};
use crate::models::CorrectionFile;
use crate::orchestrator::{CorrectionsQuery, CorrectionsSource};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::file_downloader::{
    commit_downloads, discard_downloads, safe_file_name, stage_download, StagedDownload,
};

/// One entry of the corrections listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CorrectionDocument {
    pub name: String,
    /// Download location; absolute or relative to the API root
    #[serde(default)]
    pub url: Option<String>,
}

/// Parses the root URL so relative joins keep its path prefix.
fn api_base(root_url: &str) -> AppResult<Url> {
    let mut base = Url::parse(root_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

/// Builds `<root>/isirs/corrections?startDate=..&endDate=..`.
///
/// `start` and `end` are expected in `MM-DD-YYYY` form.
pub fn corrections_url(root_url: &str, start: &str, end: &str) -> AppResult<Url> {
    let mut url = api_base(root_url)?.join(CORRECTIONS_PATH)?;
    url.query_pairs_mut()
        .append_pair("startDate", start)
        .append_pair("endDate", end);
    Ok(url)
}

/// Resolves where a listed document is downloaded from.
///
/// Uses the document's own `url` when present (resolved against the root),
/// otherwise `<root>/isirs/corrections/<name>`.
pub fn document_url(root_url: &str, document: &CorrectionDocument) -> AppResult<Url> {
    let base = api_base(root_url)?;
    if let Some(url) = document.url.as_deref() {
        return Ok(base.join(url)?);
    }

    let mut url = base.join(CORRECTIONS_PATH)?;
    url.path_segments_mut()
        .map_err(|_| AppError::Url(format!("{root_url} cannot be a base URL")))?
        .push(&document.name);
    Ok(url)
}

/// Parses the JSON array returned by the corrections listing.
pub fn parse_corrections(body: &str) -> AppResult<Vec<CorrectionDocument>> {
    Ok(serde_json::from_str(body)?)
}

/// Client for the StudentVerification corrections endpoints.
#[derive(Debug, Clone)]
pub struct SvApiClient {
    client: reqwest::Client,
}

impl SvApiClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Lists the correction documents batched between the query dates.
    ///
    /// # Errors
    ///
    /// Returns `Fetch` on network failures, non-success statuses or a body
    /// that is not a JSON array of documents.
    pub async fn list_corrections(
        &self,
        query: &CorrectionsQuery,
    ) -> AppResult<Vec<CorrectionDocument>> {
        let url = corrections_url(&query.root_url, &query.start, &query.end)
            .map_err(|e| AppError::Fetch(format!("Cannot build corrections URL: {e}")))?;

        debug!(url = %url, "Listing ISIR corrections");

        let response = self
            .client
            .get(url.as_str())
            .header(AUTHORIZATION, query.token.header_value())
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("Corrections request failed: {e}")))?;

        let status = response.status();
        let response = response.error_for_status().map_err(|e| {
            let status_code = status.as_u16();
            AppError::Fetch(format!("HTTP {status_code}: corrections listing failed: {e}"))
        })?;

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Fetch(format!("Failed to read corrections listing: {e}")))?;

        parse_corrections(&body)
            .map_err(|e| AppError::Fetch(format!("Unexpected corrections listing: {e}")))
    }

    async fn stage_document(
        &self,
        query: &CorrectionsQuery,
        document: &CorrectionDocument,
    ) -> AppResult<StagedDownload> {
        let url = document_url(&query.root_url, document).map_err(|e| {
            AppError::Fetch(format!("Cannot resolve URL for {}: {e}", document.name))
        })?;
        stage_download(
            &self.client,
            &url,
            &query.token,
            &query.target_dir,
            &document.name,
        )
        .await
    }
}

#[async_trait]
impl CorrectionsSource for SvApiClient {
    /// Lists the corrections and downloads each one, in order.
    ///
    /// Files stay as `.part` until every download succeeded, then all are
    /// renamed. The first failure discards everything written by this fetch.
    async fn corrections(&self, query: &CorrectionsQuery) -> AppResult<Vec<CorrectionFile>> {
        let documents = self.list_corrections(query).await?;
        info!(
            documents = documents.len(),
            start = %query.start,
            end = %query.end,
            "Corrections listed"
        );

        let mut staged: Vec<StagedDownload> = Vec::with_capacity(documents.len());
        for document in &documents {
            let result = match safe_file_name(&document.name) {
                Ok(name) if staged.iter().any(|s| s.name == name) => Err(AppError::Fetch(
                    format!("Corrections listing names '{name}' more than once"),
                )),
                _ => self.stage_document(query, document).await,
            };
            match result {
                Ok(download) => staged.push(download),
                Err(e) => {
                    discard_downloads(&staged).await;
                    return Err(e);
                }
            }
        }

        commit_downloads(staged).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrections_url_keeps_root_path() {
        let url = corrections_url("https://api.example.com/sv", "09-21-2015", "09-22-2015").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/sv/isirs/corrections?startDate=09-21-2015&endDate=09-22-2015"
        );
    }

    #[test]
    fn test_corrections_url_with_trailing_slash() {
        let url = corrections_url("https://api.example.com/", "01-01-2016", "01-31-2016").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/isirs/corrections?startDate=01-01-2016&endDate=01-31-2016"
        );
    }

    #[test]
    fn test_corrections_url_invalid_root() {
        assert!(corrections_url("not a url", "01-01-2016", "01-31-2016").is_err());
    }

    #[test]
    fn test_document_url_defaults_to_name() {
        let doc = CorrectionDocument {
            name: "IDSA16OP 0921.dat".to_string(),
            url: None,
        };
        let url = document_url("https://api.example.com/sv", &doc).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/sv/isirs/corrections/IDSA16OP%200921.dat"
        );
    }

    #[test]
    fn test_document_url_relative_and_absolute() {
        let relative = CorrectionDocument {
            name: "a.dat".to_string(),
            url: Some("documents/42".to_string()),
        };
        assert_eq!(
            document_url("https://api.example.com/sv", &relative)
                .unwrap()
                .as_str(),
            "https://api.example.com/sv/documents/42"
        );

        let absolute = CorrectionDocument {
            name: "b.dat".to_string(),
            url: Some("https://files.example.com/b.dat".to_string()),
        };
        assert_eq!(
            document_url("https://api.example.com/sv", &absolute)
                .unwrap()
                .as_str(),
            "https://files.example.com/b.dat"
        );
    }

    #[test]
    fn test_parse_corrections_ignores_extra_fields() {
        let body = r#"[
            {"name": "IDSA16OP.dat", "id": 7, "dateBatched": "2015-09-21"},
            {"name": "IDSA16OP_2.dat", "url": "documents/8"}
        ]"#;
        let docs = parse_corrections(body).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name, "IDSA16OP.dat");
        assert!(docs[0].url.is_none());
        assert_eq!(docs[1].url.as_deref(), Some("documents/8"));
    }

    #[test]
    fn test_parse_corrections_empty_list() {
        assert!(parse_corrections("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_corrections_rejects_non_array() {
        let err = parse_corrections(r#"{"message": "unauthorized"}"#).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }
}
