use proofsheet::config::ServiceConfig;
use proofsheet::server::{self, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServiceConfig::from_env().expect("Failed to load configuration");
    let addr = config.socket_addr().expect("Invalid listen address");
    let app = server::router(AppState::from_config(&config));

    info!("Report engine listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app)
        .await
        .expect("Server failed");
}
