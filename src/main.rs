use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use assessment_console::{
    backend::BackendClient,
    build_router,
    config::{get_config, init_config},
    services::webhook_service::WebhookService,
    AppState,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AUTH_EVENT_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();
    init_config()?;
    let config = get_config().clone();

    let (events, auth_events) = broadcast::channel(AUTH_EVENT_CAPACITY);
    let backend = BackendClient::new(&config.backend_url, config.backend_anon_key.clone(), events)?;
    let webhook = WebhookService::new(
        config.answer_webhook_url.clone(),
        Duration::from_secs(config.webhook_timeout_secs),
    )?;
    info!("Backend: {}", config.backend_url);

    let backend = Arc::new(backend);
    let app_state = AppState::new(config.clone(), backend.clone(), backend, Arc::new(webhook));

    {
        let registry = app_state.registry.clone();
        tokio::spawn(registry.run(auth_events));
    }

    let app = build_router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
