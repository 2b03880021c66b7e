// src/main.rs

use std::process::ExitCode;

use workerchain::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("workerchain: failed to initialise logging: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("workerchain error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
