//! `dashdl --check-dependencies`: verify ffmpeg can be launched.

use dashdl_core::config::DashdlConfig;
use dashdl_core::merge::Merger;
use std::process::ExitCode;

pub fn run_check_dependencies(cfg: &DashdlConfig) -> ExitCode {
    match Merger::new(&cfg.ffmpeg).check_dependencies() {
        Ok(()) => {
            println!("Dependency Check: PASS");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::warn!("dependency check failed: {:#}", anyhow::Error::from(e));
            println!("Dependency Check: FAIL");
            ExitCode::FAILURE
        }
    }
}
