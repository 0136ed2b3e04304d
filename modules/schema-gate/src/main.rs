use std::process::ExitCode;

use tracing::info;

use schema_gate::engine::MySqlEngineFactory;
use schema_gate::{orchestrator, status, telemetry, Config, EnvSnapshot, StartupError};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let log_level = telemetry::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => return fail(e.into()),
    };
    if config.debug {
        log_level.enable_debug();
    }

    let env = EnvSnapshot::capture();
    let engine = match orchestrator::prepare(&config, &env, &MySqlEngineFactory).await {
        Ok(engine) => engine,
        Err(e) => return fail(e),
    };

    match status::serve(config.port, engine).await {
        Ok(()) => info!("Execution terminated"),
        Err(e) => info!(error = %e, "Execution terminated"),
    }
    ExitCode::SUCCESS
}

fn fail(err: StartupError) -> ExitCode {
    err.log();
    ExitCode::from(err.exit_code())
}
