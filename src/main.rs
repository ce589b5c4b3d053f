//! Flight status board service

use std::sync::Arc;

use flight_board::board::ConsoleBoard;
use flight_board::config::AppConfig;
use flight_board::errors::FlightBoardError;
use flight_board::server::{self, AppState};
use flight_board::service::FlightService;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), FlightBoardError> {
    #[cfg(feature = "dotenvy")]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // File first, environment variables override
    let config = AppConfig::load()?;
    if let Err(e) = config.validate() {
        error!("{}", e);
        return Err(e);
    }

    let service = Arc::new(FlightService::from_config(&config)?);
    info!("Flight data provider: {}", service.provider_name());

    // Console board stops when the handle goes out of scope
    let _board = if config.board.enabled {
        Some(ConsoleBoard::new(service.clone(), &config.board)?.spawn())
    } else {
        None
    };

    let app = server::router(AppState {
        service,
        default_airport: config.server.default_airport.clone(),
    });

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Could not listen for shutdown signal: {}", e),
    }
}
