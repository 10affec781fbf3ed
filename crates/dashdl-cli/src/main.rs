use dashdl_core::logging;

mod cli;

use crate::cli::Cli;

fn main() -> std::process::ExitCode {
    // Initialize logging as early as possible; fall back to stderr.
    if let Err(e) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {:#}", e);
    }

    match Cli::run_from_args() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("dashdl error: {:#}", err);
            std::process::ExitCode::FAILURE
        }
    }
}
