//! Judgment document downloads.
//!
//! Downloads are plain HTTP GETs written verbatim to the download
//! directory. A failed download is recoverable: it is logged and the
//! caller keeps going, so a case record may reference a file that was
//! never written.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Resolve a non-colliding variant of `path` by appending `_1`, `_2`, …
/// before the extension until the path does not exist. Never overwrites.
pub fn dedup_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().to_string());
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    let mut counter = 1;
    loop {
        let name = match &ext {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Derive a local filename from the URL's path basename.
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let name = parsed.path_segments()?.next_back()?.to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Download `url` to a non-colliding variant of `dest`.
///
/// Returns the path actually written, or `None` when nothing was written:
/// an empty `url` is a logged no-op, and a non-200 status or network error
/// is a logged, recoverable per-call failure. Only local I/O failures
/// writing the resolved path are returned as errors.
pub async fn fetch(client: &reqwest::Client, url: &str, dest: &Path) -> Result<Option<PathBuf>> {
    if url.is_empty() {
        info!("No URL provided for downloading");
        return Ok(None);
    }

    let target = dedup_path(dest);

    let resp = match client.get(url).send().await {
        Ok(resp) => resp,
        Err(e) => {
            warn!("Error downloading file from {}: {}", url, e);
            return Ok(None);
        }
    };

    if resp.status() != reqwest::StatusCode::OK {
        warn!(
            "Failed to download file, status code: {} ({})",
            resp.status(),
            url
        );
        return Ok(None);
    }

    let bytes = match resp.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Error reading download body from {}: {}", url, e);
            return Ok(None);
        }
    };

    std::fs::write(&target, &bytes)
        .with_context(|| format!("Failed to write download to {}", target.display()))?;
    info!("File downloaded successfully: {}", target.display());
    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn dedup_path_leaves_free_path_alone() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("judgment.pdf");
        assert_eq!(dedup_path(&p), p);
    }

    #[test]
    fn dedup_path_numbers_collisions_in_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("judgment.pdf");

        // Nth request against the same base resolves to suffix _N-1.
        for expected in [
            "judgment.pdf",
            "judgment_1.pdf",
            "judgment_2.pdf",
            "judgment_3.pdf",
        ] {
            let resolved = dedup_path(&base);
            assert_eq!(resolved.file_name().unwrap().to_str().unwrap(), expected);
            std::fs::write(&resolved, b"x").unwrap();
        }
    }

    #[test]
    fn dedup_path_handles_missing_extension() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("judgment");
        std::fs::write(&base, b"x").unwrap();
        let resolved = dedup_path(&base);
        assert_eq!(resolved.file_name().unwrap().to_str().unwrap(), "judgment_1");
    }

    #[test]
    fn filename_from_url_takes_basename() {
        assert_eq!(
            filename_from_url("https://example.org/caselaw/files/ORDER_123.pdf").as_deref(),
            Some("ORDER_123.pdf")
        );
        assert_eq!(filename_from_url("https://example.org/"), None);
        assert_eq!(filename_from_url("not a url"), None);
    }

    #[tokio::test]
    async fn empty_url_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("judgment.pdf");
        let client = reqwest::Client::new();

        let written = fetch(&client, "", &dest).await.unwrap();
        assert!(written.is_none());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn non_200_writes_nothing_and_does_not_fail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/missing.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing.pdf");
        let client = reqwest::Client::new();

        let url = format!("{}/files/missing.pdf", server.uri());
        let written = fetch(&client, &url, &dest).await.unwrap();
        assert!(written.is_none());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn ok_response_writes_body_verbatim() {
        let body: &[u8] = b"%PDF-1.7 fake judgment bytes";
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/j.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("j.pdf");
        let client = reqwest::Client::new();

        let url = format!("{}/files/j.pdf", server.uri());
        let written = fetch(&client, &url, &dest).await.unwrap().unwrap();
        assert_eq!(written, dest);
        assert_eq!(std::fs::read(&written).unwrap(), body);
    }

    #[tokio::test]
    async fn second_download_gets_suffixed_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"two" as &[u8]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("j.pdf");
        std::fs::write(&dest, b"one").unwrap();
        let client = reqwest::Client::new();

        let url = format!("{}/files/j.pdf", server.uri());
        let written = fetch(&client, &url, &dest).await.unwrap().unwrap();
        assert_eq!(written.file_name().unwrap().to_str().unwrap(), "j_1.pdf");
        // The colliding original is untouched.
        assert_eq!(std::fs::read(&dest).unwrap(), b"one");
        assert_eq!(std::fs::read(&written).unwrap(), b"two");
    }
}
