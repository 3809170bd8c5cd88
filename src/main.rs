use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use classreel::{api::create_router, app_state::AppState, config::Config, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let state = AppState::new(config).await?;

    seed::bootstrap(&state.store, &state.config).await?;

    let addr = state.config.server_address();
    let app = create_router(state).layer(CorsLayer::permissive());

    info!("classreel listening on http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
