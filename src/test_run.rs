//! Test-run registration against the TestNod API.
//!
//! Registration is a single POST carrying tags and CI metadata. A 201 response
//! carries the presigned URL the report is uploaded to afterwards.

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, TestNodError};
use crate::http_client::AsyncHttpClient;

/// Header carrying the project token
pub const PROJECT_TOKEN_HEADER: &str = "Project-Token";

/// Body of the "create test run" request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTestRunRequest {
    pub tags: Vec<Tag>,
    pub test_run: TestRun,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRun {
    pub metadata: TestRunMetadata,
}

/// A free-form label attached to a test run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub value: String,
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }
}

/// CI/CD metadata for a test run; unset fields are sent as empty strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunMetadata {
    pub branch: String,
    pub commit_sha: String,
    pub run_url: String,
    pub build_id: String,
}

impl CreateTestRunRequest {
    pub fn new(tags: Vec<Tag>, metadata: TestRunMetadata) -> Self {
        Self {
            tags,
            test_run: TestRun { metadata },
        }
    }
}

/// Success envelope returned with `201 Created`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunCreated {
    pub id: i64,
    pub project: String,
    pub test_run_url: String,
    pub presigned_url: String,
}

/// Failure envelope returned with any other status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEnvelope {
    pub error_message: String,
}

/// Register a test run and return the server's success envelope.
///
/// Transport failures and any status other than 201 are retried per the
/// client's retry policy. A 201 whose body cannot be read or does not decode
/// is returned immediately as [`TestNodError::ReadBody`] or
/// [`TestNodError::Decode`].
pub async fn create_test_run(
    http: &AsyncHttpClient,
    url: &str,
    project_token: &str,
    request: &CreateTestRunRequest,
) -> Result<TestRunCreated> {
    let body = serde_json::to_vec(request).map_err(TestNodError::Serialize)?;

    let response = http
        .retry_policy()
        .retry("create test run", |attempt| {
            send_create_test_run(http, url, project_token, &body, attempt)
        })
        .await?;

    let bytes = response.bytes().await.map_err(TestNodError::ReadBody)?;
    let created: TestRunCreated = serde_json::from_slice(&bytes).map_err(TestNodError::Decode)?;

    info!(id = created.id, project = %created.project, "created test run");
    Ok(created)
}

async fn send_create_test_run(
    http: &AsyncHttpClient,
    url: &str,
    project_token: &str,
    body: &[u8],
    attempt: u32,
) -> Result<reqwest::Response> {
    debug!(url, attempt, "creating test run");

    let request = http
        .client()
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "application/json")
        .header(PROJECT_TOKEN_HEADER, project_token)
        .body(body.to_vec());

    let response = http.send(request, url).await?;

    let status = response.status();
    if status != StatusCode::CREATED {
        let message = response
            .json::<FailureEnvelope>()
            .await
            .ok()
            .map(|failure| failure.error_message);
        return Err(TestNodError::UnexpectedStatus { status, message });
    }

    Ok(response)
}
