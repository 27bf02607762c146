/// Readiness and persistence probe
///
/// Brings up the compose stack, waits for every dependency, checks the HTTP
/// surface, writes a conversation and verifies it survives a restart of the
/// datastore and the backend.
///
/// Usage:
/// ```bash
/// cargo run --bin persistence-probe -- [OPTIONS]
/// ```
///
/// Exit code 0 when every fatal check passed, 1 otherwise.
use anyhow::{Context, Result};
use persistence_probe::cli::{parse_args, print_help, CliCommand};
use persistence_probe::{BackendClient, DockerCompose, MarkerFile, MongoStore, Probe, ProbeConfig};
use service_health::ReadinessGateBuilder;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let options = match parse_args(std::env::args().skip(1))? {
        CliCommand::Run(options) => options,
        CliCommand::Help => {
            print_help();
            return Ok(ExitCode::SUCCESS);
        }
    };

    let config = ProbeConfig::from_env().context("Failed to load probe configuration")?;
    config.validate()?;

    info!(
        backend = %config.backend_url,
        compose_file = %config.compose_file.display(),
        ?options,
        "Starting persistence probe"
    );

    // Dropped on every return below, which deletes the file
    let marker = MarkerFile::new(&config.marker_path);

    let store = MongoStore::connect(&config.mongodb_url, &config.mongodb_db_name)
        .await
        .context("Invalid MongoDB connection string")?;

    let gate = ReadinessGateBuilder::new()
        .with_attempt_timeout(config.http_timeout())
        .with_mongo(config.datastore_service.clone(), store.client().clone())
        .with_http(
            config.index_service.clone(),
            config.index_heartbeat_url(),
            None::<String>,
        )
        .with_http(
            config.backend_service.clone(),
            config.backend_health_url(),
            Some("healthy"),
        )
        .build()
        .context("Failed to build readiness checks")?;

    let backend = BackendClient::new(&config.backend_url, config.http_timeout())
        .context("Failed to build backend client")?;
    let runtime = Arc::new(DockerCompose::from_config(&config));

    let probe = Probe::new(
        config,
        options,
        runtime,
        Arc::new(store),
        gate,
        backend,
        &marker,
    );

    let outcome = tokio::select! {
        outcome = probe.run() => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cleaning up");
            return Ok(ExitCode::FAILURE);
        }
    };

    Ok(outcome.exit_code())
}
