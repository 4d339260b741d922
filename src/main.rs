//! Task Tracker - interactive multi-user task list

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = task_tracker::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
