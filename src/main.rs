use admin_provisioning::{
    config::{get_config, init_config, BackendMode},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    init_config()?;
    let config = get_config()?;

    let pool = match (config.backend_mode, config.database_url.as_deref()) {
        (BackendMode::Postgres, Some(database_url)) => {
            let pool = create_pool(database_url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            Some(pool)
        }
        _ => None,
    };
    info!(backend = ?config.backend_mode, authz = ?config.authz_mode, "Collaborators configured");

    let app_state = AppState::from_config(config, pool).await?;
    let app = routes::router(app_state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
