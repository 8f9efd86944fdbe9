//! Single-shot HTTP download of a dataset archive.
//!
//! The body is streamed to disk verbatim. There is no retry: a failed
//! transfer aborts the report run.

use std::path::Path;

use futures::StreamExt as _;
use tokio::io::AsyncWriteExt as _;

use crate::progress::ProgressCallback;

/// User-Agent sent with every download.
const USER_AGENT: &str = "stop-report/0.1";

/// Downloads `url` to `dest`, returning the number of bytes written.
///
/// The parent directory of `dest` is created if needed.
///
/// # Errors
///
/// Returns [`FetchError`] if the connection fails, the response status is
/// not 2xx, the body ends before its declared `Content-Length`, or the
/// local file cannot be written.
pub async fn download_file(
    url: &str,
    dest: &Path,
    progress: &dyn ProgressCallback,
) -> Result<u64, FetchError> {
    log::info!("Downloading {url}");
    log::debug!("  -> {}", dest.display());

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FetchError::Io {
                path: parent.display().to_string(),
                source: e,
            })?;
    }

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(FetchError::Http)?;

    let response = client.get(url).send().await.map_err(FetchError::Http)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let expected = response.content_length();
    if let Some(size) = expected {
        progress.set_total(size);
        #[allow(clippy::cast_precision_loss)]
        let mb = size as f64 / 1_048_576.0;
        log::debug!("  file size: {mb:.1} MB");
    }
    progress.set_message(format!("Downloading {}", file_label(dest)));

    let downloaded = match write_body(url, response, dest, expected, progress).await {
        Ok(downloaded) => downloaded,
        Err(e) => {
            // A partial file is never left behind.
            if let Err(remove) = tokio::fs::remove_file(dest).await
                && remove.kind() != std::io::ErrorKind::NotFound
            {
                log::warn!("Failed to remove {}: {remove}", dest.display());
            }
            return Err(e);
        }
    };

    #[allow(clippy::cast_precision_loss)]
    let mb = downloaded as f64 / 1_048_576.0;
    log::info!("  download complete: {mb:.1} MB");
    progress.finish(format!("{} ({mb:.1} MB)", file_label(dest)));

    Ok(downloaded)
}

async fn write_body(
    url: &str,
    response: reqwest::Response,
    dest: &Path,
    expected: Option<u64>,
    progress: &dyn ProgressCallback,
) -> Result<u64, FetchError> {
    let io_err = |e| FetchError::Io {
        path: dest.display().to_string(),
        source: e,
    };
    let truncated = |received| FetchError::Truncated {
        url: url.to_string(),
        expected: expected.unwrap_or_default(),
        received,
    };

    let mut file = tokio::fs::File::create(dest).await.map_err(io_err)?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(_) if expected.is_some_and(|len| downloaded < len) => {
                return Err(truncated(downloaded));
            }
            Err(e) => return Err(FetchError::Http(e)),
        };
        file.write_all(&chunk).await.map_err(io_err)?;
        downloaded += chunk.len() as u64;
        progress.inc(chunk.len() as u64);
    }

    file.flush().await.map_err(io_err)?;

    if expected.is_some_and(|len| downloaded < len) {
        return Err(truncated(downloaded));
    }

    Ok(downloaded)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Errors from fetching a remote archive.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection or transfer error.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Body shorter than the declared `Content-Length`.
    #[error("Truncated download from {url}: expected {expected} bytes, got {received}")]
    Truncated {
        /// Request URL.
        url: String,
        /// Declared length.
        expected: u64,
        /// Bytes actually received.
        received: u64,
    },

    /// I/O error writing to disk.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;

    use super::*;
    use crate::progress::NullProgress;

    /// Serves one canned HTTP response on a loopback port and returns its URL.
    async fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut request = Vec::new();
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(&response).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}/archive.csv")
    }

    #[tokio::test]
    async fn writes_body_verbatim() {
        let body = b"a,b\n1,2\n";
        let mut response =
            format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", body.len())
                .into_bytes();
        response.extend_from_slice(body);
        let url = serve_once(response).await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("archive.csv");
        let written = download_file(&url, &dest, &NullProgress).await.unwrap();

        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let response =
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec();
        let url = serve_once(response).await;

        let dir = tempfile::tempdir().unwrap();
        let err = download_file(&url, &dir.path().join("x.csv"), &NullProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn short_body_is_truncated_and_removed() {
        let mut response =
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\n".to_vec();
        response.extend_from_slice(b"0123456789");
        let url = serve_once(response).await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("short.csv");
        let err = download_file(&url, &dest, &NullProgress).await.unwrap_err();

        assert!(
            matches!(err, FetchError::Truncated { expected: 100, received, .. } if received <= 10),
            "{err:?}"
        );
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn connection_refused_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let err = download_file(
            &format!("http://{addr}/gone.csv"),
            &dir.path().join("gone.csv"),
            &NullProgress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, FetchError::Http(_)));
    }
}
