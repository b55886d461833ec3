use crate::errors::{AppError, AppResult};
use crate::models::{AuthorizationToken, CorrectionFile};
use futures::StreamExt;
use reqwest::header::AUTHORIZATION;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

/// Checks that a remote file name is a plain file name.
///
/// Rejects empty names, `.`/`..` and anything containing a path separator so
/// a download can never escape the target directory.
pub fn safe_file_name(name: &str) -> AppResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.contains('\0')
    {
        return Err(AppError::Fetch(format!(
            "Refusing to write correction file with unsafe name '{name}'"
        )));
    }
    Ok(trimmed)
}

/// A correction file fully written to `<name>.part`, not yet visible under
/// its final name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedDownload {
    /// Sanitized file name, as written to disk
    pub name: String,
    pub tmp_path: PathBuf,
    pub file_path: PathBuf,
}

/// Downloads one correction file into `<target_dir>/<name>.part`.
///
/// The final `<name>` is only created by [`commit_downloads`], so a batch
/// that fails halfway never leaves a file that looks finished. A partial
/// `.part` left by a failed transfer is removed before returning.
///
/// # Errors
///
/// Returns `Fetch` if the name is unsafe, the request fails or returns a
/// non-success status, or the file cannot be written.
pub async fn stage_download(
    client: &reqwest::Client,
    url: &Url,
    token: &AuthorizationToken,
    target_dir: &Path,
    name: &str,
) -> AppResult<StagedDownload> {
    let filename = safe_file_name(name)?;
    let staged = StagedDownload {
        name: filename.to_string(),
        tmp_path: target_dir.join(format!("{filename}.part")),
        file_path: target_dir.join(filename),
    };

    debug!(filename = filename, url = %url, "Downloading correction file");

    if let Err(e) = write_to_temp(client, url, token, &staged.tmp_path, filename).await {
        remove_quietly(&staged.tmp_path).await;
        return Err(e);
    }

    Ok(staged)
}

/// Renames every staged `.part` file to its final name.
///
/// All or nothing: if one rename fails, files already renamed by this call
/// and the remaining `.part` files are deleted.
pub async fn commit_downloads(staged: Vec<StagedDownload>) -> AppResult<Vec<CorrectionFile>> {
    let mut files: Vec<CorrectionFile> = Vec::with_capacity(staged.len());

    for (index, download) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(&download.tmp_path, &download.file_path).await {
            for committed in &files {
                remove_quietly(&committed.path).await;
            }
            discard_downloads(&staged[index..]).await;
            return Err(AppError::Fetch(format!(
                "Failed to rename temp file {} to {}: {}",
                download.tmp_path.display(),
                download.file_path.display(),
                e
            )));
        }
        files.push(CorrectionFile {
            name: download.name.clone(),
            path: download.file_path.clone(),
        });
    }

    Ok(files)
}

/// Deletes the `.part` files of downloads that will not be committed.
pub async fn discard_downloads(staged: &[StagedDownload]) {
    for download in staged {
        remove_quietly(&download.tmp_path).await;
    }
}

async fn remove_quietly(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            file_path = %path.display(),
            error = %e,
            "Failed to remove incomplete download"
        ),
    }
}

async fn write_to_temp(
    client: &reqwest::Client,
    url: &Url,
    token: &AuthorizationToken,
    tmp_path: &Path,
    filename: &str,
) -> AppResult<()> {
    let response = client
        .get(url.as_str())
        .header(AUTHORIZATION, token.header_value())
        .send()
        .await
        .map_err(|e| AppError::Fetch(format!("Failed to download {filename}: {e}")))?;

    let status = response.status();
    let response = response.error_for_status().map_err(|e| {
        let status_code = status.as_u16();
        AppError::Fetch(format!(
            "HTTP {status_code}: Failed to download {filename}: {e}"
        ))
    })?;

    let mut file = File::create(tmp_path).await.map_err(|e| {
        AppError::Fetch(format!(
            "Failed to create temp file {}: {}",
            tmp_path.display(),
            e
        ))
    })?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| AppError::Fetch(format!("Failed to download {filename}: {e}")))?;
        file.write_all(&chunk).await.map_err(|e| {
            AppError::Fetch(format!(
                "Failed to write to temp file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;
    }

    file.flush().await.map_err(|e| {
        AppError::Fetch(format!(
            "Failed to flush temp file {}: {}",
            tmp_path.display(),
            e
        ))
    })?;

    Ok(())
}
