// src/main.rs

use std::process::ExitCode;

use sitepipe::errors::{Result, SitepipeError};
use sitepipe::logging::error_style;
use sitepipe::{cli, logging, run};

// Returning instead of calling `process::exit` lets the runtime shut down,
// which drops every child handle and kills the processes still running.
#[tokio::main]
async fn main() -> ExitCode {
    match run_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if !matches!(err, SitepipeError::Interrupted) {
                eprintln!("{} {err}", error_style("sitepipe error:").bold());
            }
            ExitCode::from(err.exit_status())
        }
    }
}

async fn run_main() -> Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
