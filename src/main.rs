use std::io::{self, Read, Write};
use std::process::ExitCode;

use brick_srs::config::Config;
use brick_srs::logging::init_tracing;
use brick_srs::scheduler::{ReviewRequest, Scheduler, SchedulerError};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    if let Err(e) = init_tracing(&config.log_config()) {
        eprintln!("{e}");
        return ExitCode::from(1);
    }

    let params = match config.scheduler_parameters() {
        Ok(params) => params,
        Err(e) => {
            tracing::error!(error = %e, "Invalid scheduler configuration");
            return ExitCode::from(1);
        }
    };
    let scheduler = Scheduler::new(params);

    let mut raw = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut raw) {
        tracing::error!(error = %e, "Failed to read review request");
        return ExitCode::from(1);
    }

    let response = match review(&scheduler, &raw) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Review request rejected");
            return ExitCode::from(2);
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{response}") {
        tracing::error!(error = %e, "Failed to write review response");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn review(scheduler: &Scheduler, raw: &str) -> Result<String, SchedulerError> {
    let request: ReviewRequest = serde_json::from_str(raw)?;
    let response = scheduler.handle(&request)?;
    Ok(serde_json::to_string(&response)?)
}
