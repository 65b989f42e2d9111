//! Validate → register → upload.
//!
//! Each phase runs to completion before the next starts. A failed upload
//! leaves the registered test run in place; nothing is rolled back.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::config::RunConfig;
use crate::error::{Result, TestNodError};
use crate::http_client::{AsyncHttpClient, HttpClientConfig};
use crate::output::Output;
use crate::test_run::{TestRunCreated, create_test_run};
use crate::upload::upload_file;
use crate::validation::validate_junit_xml;

/// Failure of one pipeline phase
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(#[source] TestNodError),

    #[error("Error creating test run on TestNod: {0}")]
    CreateTestRun(#[source] TestNodError),

    #[error("There was an error uploading the file to TestNod: {source}")]
    Upload {
        test_run_url: String,
        #[source]
        source: TestNodError,
    },
}

impl PipelineError {
    /// The underlying client error
    pub fn cause(&self) -> &TestNodError {
        match self {
            PipelineError::Validation(source)
            | PipelineError::CreateTestRun(source)
            | PipelineError::Upload { source, .. } => source,
        }
    }
}

/// What a successful run did
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Validate-only mode; nothing was sent
    Validated { path: PathBuf },
    /// The report was attached to a new test run
    Uploaded {
        path: PathBuf,
        test_run: TestRunCreated,
    },
}

pub struct Pipeline {
    http: AsyncHttpClient,
}

impl Pipeline {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        Ok(Self {
            http: AsyncHttpClient::new(config)?,
        })
    }

    pub async fn run(
        &self,
        config: &RunConfig,
        output: &Output,
    ) -> std::result::Result<RunOutcome, PipelineError> {
        let path = &config.file_path;

        output.progress(&output.format_validating(path));
        validate_junit_xml(path).map_err(PipelineError::Validation)?;

        if config.validate_only {
            return Ok(RunOutcome::Validated { path: path.clone() });
        }

        output.progress(&output.format_creating_test_run(path));
        let test_run = create_test_run(
            &self.http,
            &config.upload_url,
            &config.token,
            &config.create_test_run_request(),
        )
        .await
        .map_err(PipelineError::CreateTestRun)?;

        output.progress(&output.format_uploading());
        upload_file(&self.http, path, &test_run.presigned_url)
            .await
            .map_err(|source| PipelineError::Upload {
                test_run_url: test_run.test_run_url.clone(),
                source,
            })?;

        info!(id = test_run.id, url = %test_run.test_run_url, "test run uploaded");
        Ok(RunOutcome::Uploaded {
            path: path.clone(),
            test_run,
        })
    }
}
