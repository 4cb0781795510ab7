use std::path::Path;

use futures_util::StreamExt;
use reqwest::{Client, Response};
use sha1::{Digest, Sha1};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::progress::{Progress, ProgressSink};
use crate::core::error::{DownloadError, InstallerError, InstallerResult, MirrorFailure};

/// Outcome of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchReport {
    /// The mirror that delivered the file.
    pub url: String,
    pub bytes: u64,
    /// Mirrors tried and abandoned before `url` succeeded.
    pub failed_mirrors: Vec<MirrorFailure>,
}

/// Sequential, mirror-aware downloader.
///
/// Candidates are tried once each, in order. Checksums are not enforced while
/// copying; see [`verify_sha1`] for opt-in verification.
#[derive(Clone)]
pub struct FileFetcher {
    client: Client,
}

impl FileFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Download the first reachable candidate into `dest`.
    ///
    /// Any existing file at `dest` is replaced. Progress is reported as
    /// bytes read over `expected_size` after every chunk.
    pub async fn fetch_to_file(
        &self,
        urls: &[String],
        expected_size: u64,
        dest: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<FetchReport, DownloadError> {
        let mut failed = Vec::new();

        for url in urls {
            match self.try_to_file(url, expected_size, dest, progress).await {
                Ok(bytes) => {
                    debug!("Downloaded: {} -> {:?}", url, dest);
                    return Ok(FetchReport {
                        url: url.clone(),
                        bytes,
                        failed_mirrors: failed,
                    });
                }
                Err(e) => {
                    warn!("URL {} failed; trying next one: {}", url, e);
                    failed.push(MirrorFailure {
                        url: url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(DownloadError { attempts: failed })
    }

    /// Download the first reachable candidate into memory.
    pub async fn fetch_bytes(
        &self,
        urls: &[String],
        expected_size: u64,
        progress: &dyn ProgressSink,
    ) -> Result<(Vec<u8>, FetchReport), DownloadError> {
        let mut failed = Vec::new();

        for url in urls {
            let mut buffer = Vec::with_capacity(expected_size.min(64 * 1024 * 1024) as usize);
            let attempt = async {
                let response = self.open(url).await?;
                copy_stream(response, &mut buffer, expected_size, progress).await
            };
            match attempt.await {
                Ok(bytes) => {
                    debug!("Fetched {} bytes from {}", bytes, url);
                    let report = FetchReport {
                        url: url.clone(),
                        bytes,
                        failed_mirrors: failed,
                    };
                    return Ok((buffer, report));
                }
                Err(e) => {
                    warn!("URL {} failed; trying next one: {}", url, e);
                    failed.push(MirrorFailure {
                        url: url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(DownloadError { attempts: failed })
    }

    async fn try_to_file(
        &self,
        url: &str,
        expected_size: u64,
        dest: &Path,
        progress: &dyn ProgressSink,
    ) -> InstallerResult<u64> {
        let response = self.open(url).await?;

        if tokio::fs::try_exists(dest).await.unwrap_or(false) {
            tokio::fs::remove_file(dest)
                .await
                .map_err(|e| InstallerError::io(dest, e))?;
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| InstallerError::io(parent, e))?;
        }

        // Scoped so the handle is closed before the file is used or removed.
        let result = {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|e| InstallerError::io(dest, e))?;
            copy_stream(response, &mut file, expected_size, progress).await
        };

        if result.is_err() {
            let _ = tokio::fs::remove_file(dest).await;
        }
        result
    }

    async fn open(&self, url: &str) -> InstallerResult<Response> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InstallerError::Other(format!("HTTP {} from {}", status.as_u16(), url)));
        }
        Ok(response)
    }
}

async fn copy_stream<W>(
    response: Response,
    writer: &mut W,
    expected_size: u64,
    progress: &dyn ProgressSink,
) -> InstallerResult<u64>
where
    W: AsyncWrite + Unpin,
{
    let total = match expected_size {
        0 => response.content_length().unwrap_or(0),
        n => n,
    };

    let mut read = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).await?;
        read += chunk.len() as u64;

        if total > 0 {
            progress.update(None, Progress::fraction(read as f32 / total as f32));
        } else {
            progress.update(None, Progress::Indeterminate);
        }
    }
    writer.flush().await?;

    Ok(read)
}

/// Hex SHA-1 of a file on disk.
pub async fn sha1_file(path: &Path) -> InstallerResult<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| InstallerError::io(path, e))?;
    let mut hasher = Sha1::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Check a downloaded file against its expected SHA-1 (case-insensitive).
pub async fn verify_sha1(path: &Path, expected: &str) -> InstallerResult<()> {
    let actual = sha1_file(path).await?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(InstallerError::Checksum {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
