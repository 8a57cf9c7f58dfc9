//! HTTP server initialization and routing

use axum::{routing::get, Router};
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::core::shared::state::AppState;
use crate::security::create_cors_layer;

use super::{health_check, shutdown_signal};

/// Every route the service answers, with CORS and request tracing applied.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = create_cors_layer(&app_state.config.cors_allowed_origins);

    let api_router = Router::new()
        .route("/health", get(health_check))
        .merge(crate::tickets::configure_tickets_routes())
        .merge(crate::customers::configure_customers_routes())
        .merge(crate::messages::configure_messages_routes())
        .merge(crate::dashboards::configure_dashboards_routes());

    api_router
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_axum_server(app_state: Arc<AppState>) -> std::io::Result<()> {
    let host = app_state.config.server.host.clone();
    let port = app_state.config.server.port;

    let app = build_router(app_state);

    let listener = match tokio::net::TcpListener::bind((host.as_str(), port)).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "Failed to bind to {}:{}: {} - is another instance running?",
                host, port, e
            );
            return Err(e);
        }
    };
    let addr: SocketAddr = listener.local_addr()?;
    info!("{} listening on http://{}", super::SERVICE_NAME, addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
}
