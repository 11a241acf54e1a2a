//! # edl-api — Axum REST Surface for edu-ledger
//!
//! Exposes the credential registry over HTTP. Every handler is a thin
//! adapter: parse identifiers, call one [`Registry`](edl_contract::Registry)
//! method, map the outcome to a status code.
//!
//! ## API Surface
//!
//! | Prefix                        | Module                    |
//! |-------------------------------|---------------------------|
//! | `/v1/certificates/*`          | [`routes::certificates`]  |
//! | `/v1/subjects/*/certificates` | [`routes::certificates`]  |
//! | `/v1/consents/*`              | [`routes::consents`]      |
//! | `/v1/subjects/*/consents`     | [`routes::consents`]      |
//! | `/v1/verifiers/*/consents`    | [`routes::consents`]      |
//! | `/metrics`                    | [`middleware::metrics`]   |
//!
//! ## Caller Identity
//!
//! Authentication happens in front of this service. The membership layer
//! forwards the caller's organization in `x-caller-org` and principal in
//! `x-caller-principal`; see [`extractors::Caller`].
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    app_with_metrics(state, ApiMetrics::new())
}

/// Like [`app`], counting requests into the given metrics handle.
pub fn app_with_metrics(state: AppState, metrics: ApiMetrics) -> Router {
    let api = Router::new()
        .merge(routes::certificates::router())
        .merge(routes::consents::router())
        .route("/metrics", get(middleware::metrics::render_metrics))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(metrics))
        .with_state(state.clone());

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

/// Liveness probe. Always 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. 503 while the ledger refuses transactions.
async fn readiness(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.ledger().is_available() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "ledger unavailable")
    }
}
