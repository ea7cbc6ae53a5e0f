//! Multi-table poker server using async actor model.
//!
//! Spawns the configured number of tables under one `TableManager` and
//! serves them over HTTP/WebSocket, with balances held in memory.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use log::info;
use pico_args::Arguments;
use poker_tables::TableManager;
use pt_server::{api, config::ServerConfig, ledger::Ledger, logging, metrics};

const HELP: &str = "\
Run a multi-table poker server

USAGE:
  pt_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --tables     N           Number of tables to create  [default: env MAX_TABLES or 1]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND             Prometheus scrape address (optional)
  MAX_TABLES               Number of tables to create
  TABLE_SMALL_BLIND        Small blind
  TABLE_BIG_BLIND          Big blind
  TABLE_MAX_SEATS          Seats per table (2-9)
  TABLE_RAKE_PERCENT       Rake percent (0-100)
  TABLE_RAKE_CAP           Rake cap per pot
  TABLE_TURN_TIME_SECS     Seconds per decision
  DISCONNECT_GRACE_SECS    Seconds a dropped player keeps the seat
  STARTING_BALANCE         Opening balance for new players
";

struct Args {
    bind: Option<SocketAddr>,
    num_tables: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        num_tables: pargs.opt_value_from_str("--tables")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.num_tables)?;
    config.validate()?;
    info!("Starting multi-table poker server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Metrics exporter listening on {}", addr);
    }

    let ledger = Arc::new(Ledger::new(config.starting_balance));
    let table_manager = TableManager::new(ledger.clone());

    info!("Creating {} initial table(s)...", config.num_tables);
    for i in 0..config.num_tables {
        let table_id = i as i64 + 1;
        match table_manager
            .get_or_create_table(table_id, config.table_config(i))
            .await
        {
            Ok(_) => info!("Created table {} with ID {}", i + 1, table_id),
            Err(e) => log::error!("Failed to create table {}: {}", i + 1, e),
        }
    }

    let active_count = table_manager.active_table_count().await;
    metrics::active_tables(active_count);
    info!("Server ready with {} active table(s)", active_count);

    info!("Active tables:");
    for table in table_manager.list_tables().await {
        info!(
            "  - {} (ID: {}) - {}/{} seats, blinds: {}/{}",
            table.name,
            table.table_id,
            table.seated,
            table.max_seats,
            table.small_blind,
            table.big_blind
        );
    }

    let api_state = api::AppState {
        table_manager,
        ledger,
    };
    let app = api::create_router(api_state);

    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for CTRL+C: {}", e);
    }
}
