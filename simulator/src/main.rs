use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use shared_resources::config::SimConfig;
use simulator::modules;

fn main() -> ExitCode {
    // READ CONFIGURATION
    let config = match SimConfig::get() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        },
    };

    // INITIALIZE LOGGING
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .init();
    for warning in &config.warnings {
        warn!("{}", warning);
    }
    info!(
        "scenario {}: {} floors, {} elevators, {} occupants, {} logic",
        config.scenario.name,
        config.scenario.num_floors,
        config.scenario.num_elevators,
        config.scenario.num_occupants,
        config.scenario.logic,
    );

    // RUN SIMULATION
    match modules::run(&config) {
        Ok(reports) => {
            for report in reports {
                println!("{}", report);
            }
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!("{}", e);
            eprintln!("simulation failed: {}", e);
            ExitCode::FAILURE
        },
    }
}
