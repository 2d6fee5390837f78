use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use uptime_monitor::checker::{CycleOrchestrator, HttpProbe, TriggerGate};
use uptime_monitor::config::ServerConfig;
use uptime_monitor::db;
use uptime_monitor::web;
use uptime_monitor::web::extractors::ClientAddressSource;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Command {
    /// Serve the HTTP API (default)
    #[default]
    Serve,
    /// Run a single check cycle and exit
    Check,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "uptime-server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&server_config.log_dir);
    info!("Starting uptime server, version: {}", env!("CARGO_PKG_VERSION"));

    // --- Database Pool Setup ---
    let db_pool = db::connect(&server_config).await?;
    db::ensure_schema(&db_pool).await?;

    let probe = Arc::new(HttpProbe::new(server_config.probe_timeout())?);
    let orchestrator = Arc::new(CycleOrchestrator::new(db_pool.clone(), probe));

    match args.command.unwrap_or_default() {
        Command::Check => {
            let summary = orchestrator.run_cycle().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Command::Serve => {
            if let Some(period) = server_config.check_interval() {
                tokio::spawn(orchestrator.clone().start_periodic_cycles(period));
            }

            let trigger_gate = Arc::new(TriggerGate::new(
                server_config.cron_secret.clone(),
                orchestrator,
            ));
            let client_address_source =
                ClientAddressSource::from_trust_flag(server_config.trust_forwarded_for);
            let app = web::create_axum_router(db_pool, trigger_gate, client_address_source);

            let listener = tokio::net::TcpListener::bind(&server_config.listen_addr).await?;
            info!("HTTP API listening on {}", listener.local_addr()?);

            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            info!("Server stopped.");
            Ok(())
        }
    }
}
