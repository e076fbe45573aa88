//! HTTP server implementation
//!
//! Builds the Axum router for the configured persona and runs it with
//! graceful shutdown. The persona routers own the imitated API surface;
//! this module only adds the shared middleware stack and the admin routes.

mod shutdown;
mod state;

pub use shutdown::*;
pub use state::*;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{middleware, Json, Router};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::MockConfig;
use crate::engine::EngineStats;
use crate::personas::{mistral, tei, vllm, Persona};
use crate::security::require_api_key;

/// Run the mock server
pub async fn run_server(config: MockConfig) -> anyhow::Result<()> {
    let state = AppState::new(config.clone())?;
    let app = create_router(state.clone());

    let addr = config.server.socket_addr()?;

    info!(
        "Starting OpenMockLLM v{} on {} ({} persona)",
        env!("CARGO_PKG_VERSION"),
        addr,
        config.persona
    );
    info!("Serving model: {}", config.model.name);
    info!(
        "Latency simulation: {}",
        if config.timing.enabled { "enabled" } else { "disabled" }
    );
    info!(
        "API key auth: {}",
        if config.security.api_key.is_some() { "enabled" } else { "disabled" }
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let gauge = state.engine.gauge();

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown(gauge, config.server.request_timeout()))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the router for the configured persona
pub fn create_router(state: AppState) -> Router {
    let persona_router = match state.config.persona {
        Persona::Vllm => vllm::routes(),
        Persona::Mistral => mistral::routes(),
        Persona::Tei => tei::routes(),
    };

    let security = Arc::new(state.config.security.clone());

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.server.request_timeout()));

    let mut router = persona_router
        .merge(admin_routes())
        .layer(middleware::from_fn_with_state(security, require_api_key))
        .layer(middleware_stack);

    if state.config.server.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

/// Admin and introspection routes
fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/stats", get(get_stats))
}

/// GET /admin/stats
async fn get_stats(State(state): State<AppState>) -> Json<EngineStats> {
    Json(state.engine.stats())
}
