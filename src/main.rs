use std::net::SocketAddr;

use axum_session_todo::{config::Config, route::create_router, AppState};
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "axum_session_todo=debug,tower_http=info";

// Entry point of the application
#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("🔥 Invalid configuration: {err}");
            std::process::exit(1);
        }
    };
    let port = config.port;

    // Connect to the database, refusing to start without it
    let app_state = match AppState::connect(config).await {
        Ok(state) => {
            info!("✅ Connection to the database is successful!");
            state
        }
        Err(err) => {
            error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    match app_state.sessions.purge_expired().await {
        Ok(removed) if removed > 0 => info!("Purged {removed} expired sessions"),
        Ok(_) => {}
        Err(err) => warn!("Could not purge expired sessions: {err}"),
    }

    let app = create_router(app_state);

    // Specify the address and port to run the server on
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("🚀 Server started successfully at http://localhost:{port}");

    if let Err(err) = axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
    {
        error!("🔥 Server error: {err}");
        std::process::exit(1);
    }
}
