use dotenvy::dotenv;
use relpage::{config::AppState, routes};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() {
    // load env vars
    dotenv().ok();

    // Setup formatting and environment for trace
    let fmt_layer = fmt::layer().with_file(true).with_line_number(true).pretty();
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    // Connect to database
    let app_state = match AppState::new().await {
        Ok(app_state) => Arc::new(RwLock::new(app_state)),
        Err(err) => {
            tracing::error!("Failed to set up application state: {err}");
            std::process::exit(1);
        }
    };

    let app = routes::app(app_state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let ip = SocketAddr::new([0, 0, 0, 0].into(), port);
    let listener = match tokio::net::TcpListener::bind(ip).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind {ip}: {err}");
            std::process::exit(1);
        }
    };
    tracing::info!("serving {ip}");

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {err}");
        std::process::exit(1);
    }
}
