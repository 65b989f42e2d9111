//! Upload of the raw report to the presigned URL.

use std::path::Path;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use crate::error::{Result, TestNodError};
use crate::http_client::AsyncHttpClient;

/// PUT the file at `path` to `presigned_url`.
///
/// The file is opened afresh for every attempt. Content-Length is always
/// set from the file size; some receivers reject chunked uploads.
pub async fn upload_file(http: &AsyncHttpClient, path: &Path, presigned_url: &str) -> Result<()> {
    http.retry_policy()
        .retry("upload file", |attempt| {
            put_file(http, path, presigned_url, attempt)
        })
        .await?;

    info!(path = %path.display(), "uploaded file");
    Ok(())
}

async fn put_file(
    http: &AsyncHttpClient,
    path: &Path,
    presigned_url: &str,
    attempt: u32,
) -> Result<()> {
    let (contents, length) = read_file(path).await?;
    debug!(path = %path.display(), length, attempt, "uploading file");

    let request = http
        .client()
        .put(presigned_url)
        .header(CONTENT_TYPE, "application/xml")
        .header(CONTENT_LENGTH, length)
        .body(contents);

    let response = http.send(request, presigned_url).await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(TestNodError::UnexpectedStatus {
            status,
            message: None,
        });
    }

    Ok(())
}

async fn read_file(path: &Path) -> Result<(Vec<u8>, u64)> {
    let file = File::open(path)
        .await
        .map_err(|source| TestNodError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;

    let length = file.metadata().await?.len();
    Ok(read_body(file, length).await?)
}

/// Read at most `expected` bytes; the returned length always matches the body
async fn read_body<R: AsyncRead + Unpin>(
    reader: R,
    expected: u64,
) -> std::io::Result<(Vec<u8>, u64)> {
    let mut contents = Vec::with_capacity(expected as usize);
    reader.take(expected).read_to_end(&mut contents).await?;

    let length = contents.len() as u64;
    if length != expected {
        debug!(expected, length, "file size changed while reading");
    }
    Ok((contents, length))
}
