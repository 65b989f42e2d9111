//! # testnod-uploader Library
//!
//! Validates JUnit XML reports and uploads them to TestNod in two steps:
//! register a test run, then PUT the report to the presigned URL it returns.

pub mod cli;
pub mod config;
pub mod error;
pub mod http_client;
pub mod output;
pub mod pipeline;
pub mod retry;
pub mod test_run;
pub mod upload;
pub mod validation;

pub use cli::{Cli, VerbosityLevel, failure_exit_code, normalize_args};
pub use config::{Config, ConfigError, ConfigManager, DEFAULT_UPLOAD_URL, RunConfig};
pub use error::{Result, TestNodError};
pub use http_client::{AsyncHttpClient, HttpClientConfig};
pub use output::Output;
pub use pipeline::{Pipeline, PipelineError, RunOutcome};
pub use retry::RetryPolicy;
pub use test_run::{
    CreateTestRunRequest, FailureEnvelope, Tag, TestRun, TestRunCreated, TestRunMetadata,
    create_test_run,
};
pub use upload::upload_file;
pub use validation::validate_junit_xml;
