use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};
use volunteer_hours::{
    AppState, Backend, Config, SessionStore, api::HoursApi, api::HttpHoursApi,
    mock::MockHoursApi, router,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;

    let api: Arc<dyn HoursApi> = match &config.backend {
        Backend::Http { base_url, timeout } => {
            info!(%base_url, "using remote hours API");
            Arc::new(HttpHoursApi::new(base_url, *timeout)?)
        }
        Backend::Mock { password, delay } => {
            info!("HOURS_API_URL not set, using the in-memory mock backend");
            Arc::new(MockHoursApi::new(password.clone(), *delay).with_demo_roster())
        }
    };

    let session = SessionStore::restore(config.session_path.clone()).await;
    info!(path = %session.path().display(), "session file");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, api, session));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(err) => {
            error!("failed to listen for shutdown signal: {err}");
            std::future::pending::<()>().await;
        }
    }
}
