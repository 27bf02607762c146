//! Command line parsing for the probe binary.

use crate::config::RunOptions;
use anyhow::{bail, Result};

#[derive(Debug, PartialEq, Eq)]
pub enum CliCommand {
    Run(RunOptions),
    Help,
}

pub fn parse_args<I>(args: I) -> Result<CliCommand>
where
    I: IntoIterator<Item = String>,
{
    let mut options = RunOptions::default();

    for arg in args {
        match arg.as_str() {
            "--skip-cleanup" => options.skip_cleanup = true,
            "--skip-startup" => options.skip_startup = true,
            "--no-restart" => options.no_restart = true,
            "--help" | "-h" => return Ok(CliCommand::Help),
            _ => bail!("Unknown argument: {}", arg),
        }
    }

    Ok(CliCommand::Run(options))
}

pub fn print_help() {
    println!("Readiness and Persistence Probe");
    println!();
    println!("Usage: persistence-probe [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --skip-cleanup     Keep existing containers and volumes");
    println!("  --skip-startup     Probe an already running stack (implies --skip-cleanup)");
    println!("  --no-restart       Skip the persistence-across-restart check");
    println!("  --help, -h         Show this help message");
    println!();
    println!("Environment Variables:");
    println!("  PROBE_BACKEND_URL             Backend base URL (default: http://localhost:8000)");
    println!("  PROBE_INDEX_URL               Vector index base URL (default: http://localhost:8001)");
    println!("  PROBE_MONGODB_URL             MongoDB connection string");
    println!("  PROBE_MONGODB_DB_NAME         Database name (default: docubuddy_db)");
    println!("  PROBE_COMPOSE_FILE            Compose file (default: docker-compose.yml)");
    println!("  PROBE_COMPOSE_PROJECT         Compose project name");
    println!("  PROBE_STARTUP_TIMEOUT_SECS    Readiness ceiling after bring-up (default: 60)");
    println!("  PROBE_RESTART_TIMEOUT_SECS    Readiness ceiling after restart (default: 30)");
    println!("  PROBE_MARKER_PATH             Marker file path (default: .test_conversation_id)");
    println!("  RUST_LOG                      Log filter (default: info)");
}
