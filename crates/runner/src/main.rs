use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lgr_runner::config::RunnerConfig;
use lgr_runner::{discovery, logging, orchestrator};

#[derive(Parser)]
#[command(name = "lgr-runner", version, about = "Run R transformation jobs")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Default log level; `RUST_LOG` takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Run the job described by `<DATA>/config.json`.
    Run {
        /// Data directory holding the job descriptor.
        #[arg(short, long)]
        data: PathBuf,
    },
    /// Print the script catalogue with each script's parameters.
    Parameters {
        /// Script directory; defaults to `R_SCRIPT_DIR`.
        #[arg(long)]
        scripts: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match execute(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Exiting with failure");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Command) -> anyhow::Result<()> {
    let mut config = RunnerConfig::from_env().inspect_err(|e| {
        tracing::error!("There was an error in input: {e}");
    })?;

    match command {
        Command::Run { data } => {
            let summary = orchestrator::run(&config, &data).await?;
            tracing::info!(
                intermediate_tables = summary.intermediate_tables.len(),
                files = summary.outputs.len(),
                "Run finished"
            );
        }
        Command::Parameters { scripts } => {
            if let Some(dir) = scripts {
                config.interpreter.script_dir = dir;
            }
            let catalogue = discovery::list_scripts(&config.interpreter)
                .await
                .inspect_err(|e| tracing::error!("{e}"))?;
            let body = serde_json::to_string_pretty(&catalogue)
                .context("Cannot encode script catalogue")?;
            println!("{body}");
        }
    }
    Ok(())
}
