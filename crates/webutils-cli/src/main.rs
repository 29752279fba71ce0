use webutils_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    // Fall back to stderr so an unwritable state dir doesn't stop the CLI.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = Cli::run_from_args().await {
        eprintln!("webutils error: {:#}", err);
        std::process::exit(1);
    }
}
