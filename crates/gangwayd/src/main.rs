use std::process::ExitCode;
use std::sync::Arc;

use gangwayd::{StructuredHealthReporter, SystemConfigLoader, run_daemon};

fn main() -> ExitCode {
    let reporter = Arc::new(StructuredHealthReporter::new());
    match run_daemon(
        &SystemConfigLoader,
        reporter,
        &gangwayd::SystemShutdownSignal,
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("gangwayd: {error}");
            ExitCode::FAILURE
        }
    }
}
