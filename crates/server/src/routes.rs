//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;

    let mut router = Router::new()
        .route("/", get(handlers::root))
        // Health check (intentionally unauthenticated for load balancers/k8s probes)
        .route("/health", get(handlers::health_check))
        // Sample catalogue
        .route(
            "/samples",
            get(handlers::list_samples).post(handlers::upload_sample),
        )
        .route(
            "/samples/",
            get(handlers::list_samples).post(handlers::upload_sample),
        )
        .route("/samples/{sample_id}", get(handlers::get_sample))
        // Saved samples
        .route(
            "/user/saves",
            get(handlers::list_saved_samples).post(handlers::save_sample),
        )
        .route(
            "/user/saves/",
            get(handlers::list_saved_samples).post(handlers::save_sample),
        )
        // Accounts
        .route("/users", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/whoami", get(handlers::whoami))
        .route("/auth/logout", post(handlers::logout))
        // Locally stored objects
        .route("/files/{*key}", get(handlers::get_file));

    // SECURITY: When enabled, this endpoint should be network-restricted
    // to the Prometheus scraper.
    if server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    // Layers run outermost first: Trace -> CORS -> Timeout -> body limit -> Auth -> Handler
    let mut router = router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            server.request_timeout(),
        ));

    if server.cors_allow_any {
        router = router.layer(CorsLayer::permissive());
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
