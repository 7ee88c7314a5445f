//! API Module
//!
//! HTTP handlers, rate limit middleware and routing for the backend.
//!
//! # Endpoints
//! - `GET /api/v1/` - Home
//! - `PUT /api/v1/cache` - Store a JSON value
//! - `GET /api/v1/cache/:key` - Retrieve a value
//! - `DELETE /api/v1/cache/:key` - Delete a key
//! - `POST /api/v1/cache/:key/incr` - Add to an integer value
//! - `GET /api/v1/ws` - WebSocket echo
//! - `GET /stats` - Store statistics
//! - `GET /health` - Health check endpoint

pub mod guard;
pub mod handlers;
pub mod routes;
pub mod ws;

pub use guard::{rate_limit, RouteGuard};
pub use handlers::*;
pub use routes::create_router;
pub use ws::{reply_to, sub_context, ws_handler};
