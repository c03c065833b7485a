use std::net::SocketAddr;
use std::sync::Arc;

use casting_backend::{
    config::init_config,
    database::{pool::create_pool, PgCandidateStore},
    http_client,
    middleware::cors::permissive_cors,
    routes, telegram_service, AppState,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = init_config()?;

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");

    let client = http_client(config)?;

    if let Some(base_url) = &config.webhook_base_url {
        let target_webhook_url = format!("{}/api/telegram/webhook", base_url);
        let telegram = telegram_service(config, client.clone());
        if let Err(e) = telegram.ensure_webhook(&target_webhook_url).await {
            warn!("Could not register Telegram webhook: {}", e);
        }
    }

    let store = Arc::new(PgCandidateStore::new(pool));
    let app_state = AppState::from_config(config, store, client);

    let app = routes::router(app_state)
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
