use std::path::PathBuf;

use tempfile::TempDir;
use testnod_uploader::{AsyncHttpClient, HttpClientConfig};

pub const VALID_JUNIT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite name="test" tests="1" failures="0" errors="0" time="0.001">
	<testcase name="test_example" classname="test.example" time="0.001"/>
</testsuite>"#;

/// Write `content` to a file in a fresh temp directory
pub fn write_report(name: &str, content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    (temp_dir, path)
}

/// Client with the production attempt count but a short delay
pub fn fast_client() -> AsyncHttpClient {
    AsyncHttpClient::new(HttpClientConfig {
        timeout_seconds: 5,
        retry_delay_ms: 10,
        ..Default::default()
    })
    .unwrap()
}

/// Client with the production attempt count and the given retry delay
pub fn client_with_delay(retry_delay_ms: u64) -> AsyncHttpClient {
    AsyncHttpClient::new(HttpClientConfig {
        timeout_seconds: 5,
        retry_delay_ms,
        ..Default::default()
    })
    .unwrap()
}

/// URL on a local port that was bound and released, so connections are refused
pub fn refused_url(path: &str) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}{path}")
}
