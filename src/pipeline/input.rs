//! Input resolution: turn a path or URL into a local PDF file.
//!
//! pdfium opens documents from the file system, so URLs are downloaded into
//! a `TempDir` that lives as long as the [`ResolvedInput`]. Both branches
//! check the `%PDF` magic bytes before pdfium ever sees the file.

use crate::error::LayoutError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A local PDF path, possibly backed by a temporary download.
pub enum ResolvedInput {
    Local(PathBuf),
    /// The `TempDir` is held so the download survives until processing ends.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a readable local PDF.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, LayoutError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else if input.trim().is_empty() || input.contains("://") {
        Err(LayoutError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        resolve_local(input)
    }
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, LayoutError> {
    let path = PathBuf::from(path_str);

    if !path.is_file() {
        return Err(LayoutError::FileNotFound { path });
    }

    let mut f = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(LayoutError::PermissionDenied { path });
        }
        Err(_) => return Err(LayoutError::FileNotFound { path }),
    };

    let mut magic = [0u8; 4];
    let read = f.read(&mut magic).unwrap_or(0);
    check_magic(&magic[..read], &path)?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Reject anything that does not start with `%PDF`, including files shorter
/// than the magic itself.
pub fn check_magic(head: &[u8], path: &Path) -> Result<(), LayoutError> {
    if head.len() >= PDF_MAGIC.len() && &head[..PDF_MAGIC.len()] == PDF_MAGIC {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    Err(LayoutError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, LayoutError> {
    info!("Downloading PDF from: {}", url);

    let failed = |reason: String| LayoutError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            LayoutError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let filename = filename_from_url(url);
    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    let temp_dir = TempDir::new().map_err(|e| LayoutError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(filename);
    check_magic(&bytes, &file_path)?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| LayoutError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment when it looks like a file name, else `downloaded.pdf`.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}
