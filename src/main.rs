use std::process::ExitCode;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use testnod_uploader::{
    Cli, Config, ConfigManager, HttpClientConfig, Output, Pipeline, PipelineError, RunConfig,
    TestNodError, VerbosityLevel, failure_exit_code,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let ignore_failures = cli.ignore_failures;

    // Config files and environment may change verbosity, so load them first
    let config = ConfigManager::load_config(&cli).await;
    let verbosity = match &config {
        Ok(config) => config.output.verbosity(),
        Err(_) => cli.verbosity(),
    };
    init_tracing(verbosity);
    let output = Output::new(verbosity);

    let result = match config {
        Ok(config) => run(&cli, config, &output).await,
        Err(error) => Err(TestNodError::from(error).into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            output.failure(&error);
            if let Some(pipeline_error) = error.downcast_ref::<PipelineError>()
                && let Some(hint) = output.format_hint(pipeline_error)
            {
                eprintln!("{}", hint);
            } else if let Some(client_error) = error.downcast_ref::<TestNodError>()
                && client_error.is_precondition()
            {
                eprintln!("Run 'testnod-uploader --help' for usage.");
            }
            ExitCode::from(failure_exit_code(ignore_failures))
        }
    }
}

async fn run(cli: &Cli, config: Config, output: &Output) -> anyhow::Result<()> {
    debug!(
        upload_url = %config.api.upload_url,
        network = ?config.network,
        "loaded configuration"
    );

    let run_config = RunConfig::from_cli(cli, &config)?;
    let pipeline = Pipeline::new(HttpClientConfig::from(&config.network))?;

    let outcome = pipeline.run(&run_config, output).await?;
    output.progress(&output.format_outcome(&outcome));
    Ok(())
}

fn init_tracing(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
