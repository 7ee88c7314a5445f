//! API Routes
//!
//! Configures the Axum router with all backend endpoints and attaches a
//! rate limit guard to every `/api/v1` route.

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::guard::{rate_limit, RouteGuard};
use super::handlers::{
    delete_handler, get_handler, health_handler, home_handler, increment_handler, set_handler,
    stats_handler, AppState,
};
use super::ws::ws_handler;
use crate::ratelimit::{RateLimitRule, RouteRegistry};

/// Home route: 10 requests per 5 seconds.
pub fn home_rule() -> RateLimitRule {
    RateLimitRule::new(10).seconds(5)
}

/// Cache reads: 100 per minute.
pub fn cache_read_rule() -> RateLimitRule {
    RateLimitRule::new(100).minutes(1)
}

/// Cache writes: 30 per minute.
pub fn cache_write_rule() -> RateLimitRule {
    RateLimitRule::new(30).minutes(1)
}

/// Socket messages: 5 per second per message type.
pub fn socket_message_rule() -> RateLimitRule {
    RateLimitRule::new(5).seconds(1)
}

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `GET /stats` - Statistics for both stores
/// - `GET /api/v1/` - Home
/// - `PUT /api/v1/cache` - Store a JSON value
/// - `GET /api/v1/cache/:key` - Retrieve a value
/// - `DELETE /api/v1/cache/:key` - Delete a key
/// - `POST /api/v1/cache/:key/incr` - Add to an integer value
/// - `GET /api/v1/ws` - Rate-limited WebSocket echo
///
/// Guards are registered here, once, so every route's counter key is fixed
/// before the first request arrives.
pub fn create_router(state: AppState) -> Router {
    let mut registry = RouteRegistry::new();
    let mut guard = |method: &str, path: &str, rule: RateLimitRule| {
        RouteGuard::new(state.limiter(rule), registry.endpoint(method, path))
    };

    let home = guard("GET", "/api/v1/", home_rule());
    let set = guard("PUT", "/api/v1/cache", cache_write_rule());
    let read = guard("GET", "/api/v1/cache/:key", cache_read_rule());
    let remove = guard("DELETE", "/api/v1/cache/:key", cache_write_rule());
    let incr = guard("POST", "/api/v1/cache/:key/incr", cache_write_rule());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/v1/",
            get(home_handler).route_layer(from_fn_with_state(home, rate_limit)),
        )
        .route(
            "/api/v1/cache",
            put(set_handler).route_layer(from_fn_with_state(set, rate_limit)),
        )
        .route(
            "/api/v1/cache/:key",
            get(get_handler)
                .route_layer(from_fn_with_state(read, rate_limit))
                .merge(
                    delete(delete_handler).route_layer(from_fn_with_state(remove, rate_limit)),
                ),
        )
        .route(
            "/api/v1/cache/:key/incr",
            post(increment_handler).route_layer(from_fn_with_state(incr, rate_limit)),
        )
        .route(
            "/api/v1/ws",
            get(ws_handler).with_state(state.limiter(socket_message_rule())),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
