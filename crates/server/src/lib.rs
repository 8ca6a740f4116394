pub mod config;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

pub use config::{ConfigError, ServiceConfig};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/ws", get(routes::websocket_handler))
        .layer(TraceLayer::new_for_http())
        // deployment clients connect from arbitrary origins
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve `state` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
