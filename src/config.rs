use crate::cli::{Cli, VerbosityLevel};
use crate::error::TestNodError;
use crate::test_run::{CreateTestRunRequest, Tag, TestRunMetadata};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Endpoint used when no upload URL is configured
pub const DEFAULT_UPLOAD_URL: &str = "https://testnod.com/integrations/test_runs/upload";

const CONFIG_NAMES: [&str; 4] = [
    "testnod.toml",
    "testnod.json",
    ".testnod.toml",
    ".testnod.json",
];

/// Trait for abstracting environment variable access
#[cfg_attr(test, mockall::automock)]
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings loaded from defaults, config files, and the environment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub network: NetworkConfig,
    pub output: OutputConfig,
}

/// TestNod API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// "Create test run" endpoint
    pub upload_url: String,
    /// Project token
    pub token: Option<String>,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// HTTP request timeout in seconds, per attempt
    pub timeout_seconds: u64,
    /// Total attempts per request
    pub retry_attempts: u32,
    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub verbose: bool,
    pub quiet: bool,
}

impl OutputConfig {
    pub fn verbosity(&self) -> VerbosityLevel {
        VerbosityLevel::from_flags(self.verbose, self.quiet)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            token: None,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            retry_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(&SystemEnvProvider, cli).await
    }

    pub async fn load_config_with(env: &impl EnvProvider, cli: &Cli) -> Result<Config> {
        let mut config = Config::default();

        if let Some(config_path) = &cli.config {
            config = Self::load_from_file(config_path).await?;
        } else if let Some(found_config) = Self::find_config_file().await? {
            config = found_config;
        }

        config = Self::apply_environment_overrides_with(env, config)?;
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in the current directory, then the user config directory
    pub async fn find_config_file() -> Result<Option<Config>> {
        let mut candidates: Vec<PathBuf> = CONFIG_NAMES.iter().map(PathBuf::from).collect();

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("testnod-uploader");
            candidates.extend(CONFIG_NAMES.iter().map(|name| app_config_dir.join(name)));
        }

        for path in candidates {
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(token) = env.get("TESTNOD_TOKEN")
            && !token.is_empty()
        {
            config.api.token = Some(token);
        }

        if let Some(upload_url) = env.get("TESTNOD_UPLOAD_URL")
            && !upload_url.is_empty()
        {
            config.api.upload_url = upload_url;
        }

        if let Some(timeout) = env.get("TESTNOD_TIMEOUT") {
            config.network.timeout_seconds = parse_env("TESTNOD_TIMEOUT", &timeout)?;
        }

        if let Some(attempts) = env.get("TESTNOD_RETRY_ATTEMPTS") {
            config.network.retry_attempts = parse_env("TESTNOD_RETRY_ATTEMPTS", &attempts)?;
        }

        if let Some(delay) = env.get("TESTNOD_RETRY_DELAY_MS") {
            config.network.retry_delay_ms = parse_env("TESTNOD_RETRY_DELAY_MS", &delay)?;
        }

        if let Some(verbose) = env.get("TESTNOD_VERBOSE") {
            config.output.verbose = parse_env("TESTNOD_VERBOSE", &verbose)?;
        }

        if let Some(quiet) = env.get("TESTNOD_QUIET") {
            config.output.quiet = parse_env("TESTNOD_QUIET", &quiet)?;
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if let Some(token) = &cli.token
            && !token.is_empty()
        {
            config.api.token = Some(token.clone());
        }
        if let Some(upload_url) = &cli.upload_url
            && !upload_url.is_empty()
        {
            config.api.upload_url = upload_url.clone();
        }

        if let Some(timeout) = cli.timeout {
            config.network.timeout_seconds = timeout;
        }

        // Either flag replaces whatever verbosity the lower layers chose
        if cli.verbose || cli.quiet {
            config.output.verbose = cli.verbose;
            config.output.quiet = cli.quiet;
        }

        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.api.upload_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Upload URL must not be empty".to_string(),
            ));
        }

        if config.network.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if config.network.retry_attempts == 0 {
            return Err(ConfigError::Validation(
                "Retry attempts must be at least 1".to_string(),
            ));
        }

        if config.network.retry_attempts > 10 {
            return Err(ConfigError::Validation(
                "Retry attempts cannot exceed 10".to_string(),
            ));
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Environment(format!("Invalid {} value: {}", key, value)))
}

/// Everything one pipeline run needs, fixed before any network activity
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub file_path: PathBuf,
    pub token: String,
    pub validate_only: bool,
    pub ignore_failures: bool,
    pub upload_url: String,
    pub tags: Vec<Tag>,
    pub metadata: TestRunMetadata,
}

impl RunConfig {
    /// Build the run configuration, checking local preconditions.
    ///
    /// Fails when no file was given, the file does not exist, or no token is
    /// available outside validate-only mode.
    pub fn from_cli(cli: &Cli, config: &Config) -> std::result::Result<Self, TestNodError> {
        let file_path = cli.path.clone().ok_or(TestNodError::NoFile)?;

        if !file_path.exists() {
            return Err(TestNodError::FileNotFound { path: file_path });
        }

        let token = config.api.token.clone().unwrap_or_default();
        if !cli.validate && token.is_empty() {
            return Err(TestNodError::MissingToken);
        }

        Ok(Self {
            file_path,
            token,
            validate_only: cli.validate,
            ignore_failures: cli.ignore_failures,
            upload_url: config.api.upload_url.clone(),
            tags: cli.tags.iter().map(|tag| Tag::from(tag.as_str())).collect(),
            metadata: TestRunMetadata {
                branch: cli.branch.clone(),
                commit_sha: cli.commit_sha.clone(),
                run_url: cli.run_url.clone(),
                build_id: cli.build_id.clone(),
            },
        })
    }

    /// Registration body for this run
    pub fn create_test_run_request(&self) -> CreateTestRunRequest {
        CreateTestRunRequest::new(self.tags.clone(), self.metadata.clone())
    }
}
