//! Human-facing messages
//!
//! Progress and result lines for the validate/register/upload pipeline.
//! Diagnostics go through `tracing`; this module only covers what the user
//! is meant to read.

use std::path::Path;

use crate::cli::VerbosityLevel;
use crate::pipeline::{PipelineError, RunOutcome};

/// Simple output formatter for human-readable results
pub struct Output {
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Plain output regardless of terminal; used by tests
    pub fn plain(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: false,
        }
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Print a progress line unless quiet
    pub fn progress(&self, message: &str) {
        if self.verbosity > VerbosityLevel::Quiet {
            println!("{}", message);
        }
    }

    /// Print a failure; shown at every verbosity
    pub fn failure(&self, error: &dyn std::fmt::Display) {
        eprintln!("{}", self.format_failure(error));
    }

    pub fn format_validating(&self, path: &Path) -> String {
        format!("Validating file: {}", path.display())
    }

    pub fn format_creating_test_run(&self, path: &Path) -> String {
        format!(
            "{} is a valid JUnit XML file. Creating test run...",
            path.display()
        )
    }

    pub fn format_uploading(&self) -> String {
        "Created test run, uploading JUnit XML file...".to_string()
    }

    pub fn format_outcome(&self, outcome: &RunOutcome) -> String {
        match outcome {
            RunOutcome::Validated { path } => format!(
                "{} {} is a valid JUnit XML file!",
                self.colorize("✓", "32"),
                path.display()
            ),
            RunOutcome::Uploaded { test_run, .. } => format!(
                "{} Test run uploaded successfully! TestNod will now process your test run. \
                 You can follow its progress at {}",
                self.colorize("✓", "32"),
                test_run.test_run_url
            ),
        }
    }

    pub fn format_failure(&self, error: &dyn std::fmt::Display) -> String {
        format!("{} {}", self.colorize("✗", "31"), error)
    }

    /// Extra guidance for pipeline failures, only in verbose mode
    pub fn format_hint(&self, error: &PipelineError) -> Option<String> {
        if self.verbosity < VerbosityLevel::Verbose {
            return None;
        }
        match error {
            PipelineError::Validation(_) => {
                Some("Hint: the file must be well-formed XML with a <testsuite> element".to_string())
            }
            PipelineError::CreateTestRun(_) => {
                Some("Hint: check the project token and upload URL".to_string())
            }
            PipelineError::Upload { test_run_url, .. } => Some(format!(
                "Hint: the test run at {} was created but has no report attached",
                test_run_url
            )),
        }
    }
}
