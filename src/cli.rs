use clap::Parser;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;

/// Long flags that may also be spelled with a single dash (`-token`, `-tag=x`)
const LONG_FLAGS: &[&str] = &[
    "token",
    "validate",
    "branch",
    "commit-sha",
    "run-url",
    "build-id",
    "ignore-failures",
    "upload-url",
    "tag",
    "config",
    "timeout",
    "verbose",
    "quiet",
    "help",
    "version",
];

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show errors
    Quiet,
    /// Show progress messages
    #[default]
    Normal,
    /// Show request details
    Verbose,
}

impl VerbosityLevel {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            VerbosityLevel::Quiet
        } else if verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Default `tracing` filter directive for this verbosity
    pub fn log_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "debug",
        }
    }
}

/// Validate a JUnit XML report and upload it to TestNod
#[derive(Parser, Debug, Clone)]
#[command(name = "testnod-uploader")]
#[command(about = "Validate a JUnit XML report and upload it to TestNod")]
#[command(version)]
pub struct Cli {
    /// JUnit XML file to validate and upload
    #[arg(help = "Path to the JUnit XML file")]
    pub path: Option<PathBuf>,

    /// TestNod project token
    #[arg(long = "token")]
    pub token: Option<String>,

    /// Only check the file, never upload
    #[arg(
        long = "validate",
        help = "Checks if the file is a valid JUnit XML file, returns without uploading to TestNod"
    )]
    pub validate: bool,

    #[arg(long = "branch", default_value = "", help = "The branch name used for this test run")]
    pub branch: String,

    #[arg(
        long = "commit-sha",
        default_value = "",
        help = "The commit SHA used for this test run"
    )]
    pub commit_sha: String,

    #[arg(long = "run-url", default_value = "", help = "The URL to the CI/CD run")]
    pub run_url: String,

    #[arg(
        long = "build-id",
        default_value = "",
        help = "The build identifier for the CI/CD run"
    )]
    pub build_id: String,

    #[arg(
        long = "ignore-failures",
        help = "Always return an exit code of 0 even if there are errors"
    )]
    pub ignore_failures: bool,

    #[arg(
        long = "upload-url",
        help = "Specify a custom upload URL to upload the JUnit XML file to TestNod"
    )]
    pub upload_url: Option<String>,

    #[arg(
        long = "tag",
        action = clap::ArgAction::Append,
        help = "Add a tag to this test run (can be repeated)"
    )]
    pub tags: Vec<String>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// HTTP request timeout in seconds, per attempt
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        VerbosityLevel::from_flags(self.verbose, self.quiet)
    }
}

/// Rewrite single-dash long flags (`-commit-sha=x`) to their double-dash form.
///
/// Short flags and positional arguments pass through untouched, as does
/// everything after a bare `--`.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;

    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
                    if LONG_FLAGS.contains(&name) {
                        OsString::from(format!("-{text}"))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

/// Process exit code for a failed run
pub fn failure_exit_code(ignore_failures: bool) -> u8 {
    if ignore_failures { 0 } else { 1 }
}
