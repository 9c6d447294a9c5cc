//! HTTP API server

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::analysis::{self, ContractAnalyzer};
use crate::auth::{require_auth, AuthService};
use crate::config::Config;
use crate::error::Result;
use crate::store::{self, Store};

use super::routes;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub store: Arc<dyn Store>,
    /// `None` when no LLM is configured; uploads are refused
    pub analyzer: Option<Arc<dyn ContractAnalyzer>>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        auth: AuthService,
        store: Arc<dyn Store>,
        analyzer: Option<Arc<dyn ContractAnalyzer>>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            auth: Arc::new(auth),
            store,
            analyzer,
            max_upload_bytes,
        }
    }
}

/// Open the store and wire up services from configuration
pub async fn build_state(config: &Config) -> Result<AppState> {
    let store = store::open_store(&config.database).await?;
    let auth = AuthService::from_config(&config.auth, store.clone())?;
    let analyzer = analysis::build_analyzer(&config.llm)?;

    Ok(AppState::new(
        auth,
        store,
        analyzer,
        config.server.max_upload_bytes,
    ))
}

/// Run the HTTP API server until Ctrl-C
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    config.validate()?;

    let state = build_state(&config).await?;
    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users/me", get(routes::current_user))
        .route("/contracts", get(routes::list_contracts))
        .route("/contracts/upload", post(routes::upload_contract))
        .route("/contracts/by-name/{name}", get(routes::get_contract_by_name))
        .route(
            "/contracts/{id}",
            get(routes::get_contract)
                .put(routes::update_contract)
                .delete(routes::delete_contract),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_auth,
        ));

    Router::new()
        .route("/", get(routes::root))
        .route("/login", post(routes::login))
        .route("/users/register", post(routes::register))
        .merge(protected)
        // Middleware
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
