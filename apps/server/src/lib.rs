//! # mostrador-server: HTTP API for Mostrador POS
//!
//! Thin axum layer over [`mostrador_db`]. Handlers parse input, call one
//! repository method and map errors to `{ code, error }` JSON bodies.
//!
//! ```text
//! request ─► TraceLayer ─► CorsLayer ─► Router ─► handler ─► repository
//!                                                    │
//!                                   ApiError ◄───────┘ (DbError / CoreError)
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the full application router.
///
/// `cors_origin` restricts cross-origin access to one front end; without
/// it any origin is allowed, which is what the local cashier setup needs.
pub fn build_router(state: AppState, cors_origin: Option<&str>) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::clientes::router())
        .merge(routes::productos::router())
        .merge(routes::vendedor::router())
        .merge(routes::tipos_movimiento::router())
        .merge(routes::inventario::router())
        .merge(routes::ventas::router())
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::permissive();
    };

    match HeaderValue::from_str(origin) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            warn!(origin, "Invalid CORS origin, allowing any origin");
            CorsLayer::permissive()
        }
    }
}
