//! Admission Policies
//!
//! The two pluggable decisions of the rate limiter: who the caller is, and
//! what to tell them when they are over their limit.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::ratelimit::CallerContext;

// == Rejection ==
/// Outcome handed back to the transport when a caller is denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Milliseconds left in the current window
    pub remaining_ms: u64,
    /// Retry hint in whole seconds, rounded up
    pub retry_after_secs: u64,
    /// Human readable reason
    pub message: String,
}

impl Rejection {
    /// Builds the standard "Too Many Requests" rejection.
    pub fn too_many_requests(remaining_ms: u64) -> Self {
        Self {
            remaining_ms,
            retry_after_secs: remaining_ms.div_ceil(1000),
            message: "Too Many Requests".to_string(),
        }
    }

    /// JSON body used for both HTTP responses and socket frames.
    pub fn to_json(&self) -> Value {
        json!({
            "error": self.message,
            "retry_after": self.retry_after_secs,
        })
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let body = Json(self.to_json());
        let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(self.retry_after_secs));
        response
    }
}

// == Identifier ==
/// Derives the caller identity a counter is keyed on.
pub trait Identifier: Send + Sync {
    fn identify(&self, ctx: &CallerContext) -> String;
}

impl<F> Identifier for F
where
    F: Fn(&CallerContext) -> String + Send + Sync,
{
    fn identify(&self, ctx: &CallerContext) -> String {
        self(ctx)
    }
}

/// Default identity: `{client_host}:{path}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClientPathIdentifier;

impl Identifier for ClientPathIdentifier {
    fn identify(&self, ctx: &CallerContext) -> String {
        format!("{}:{}", ctx.client_host(), ctx.path)
    }
}

// == Denial Handler ==
/// Turns a denial into the transport's "rate limited" signal.
pub trait DenialHandler: Send + Sync {
    fn on_denied(&self, ctx: &CallerContext, remaining_ms: u64) -> Rejection;
}

impl<F> DenialHandler for F
where
    F: Fn(&CallerContext, u64) -> Rejection + Send + Sync,
{
    fn on_denied(&self, ctx: &CallerContext, remaining_ms: u64) -> Rejection {
        self(ctx, remaining_ms)
    }
}

/// Default handler for HTTP requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpDenial;

impl DenialHandler for HttpDenial {
    fn on_denied(&self, ctx: &CallerContext, remaining_ms: u64) -> Rejection {
        let rejection = Rejection::too_many_requests(remaining_ms);
        warn!(
            "Rate limit exceeded for HTTP request: client={}, path={}, method={}, retry_after={}s",
            ctx.client_host(),
            ctx.path,
            ctx.method.as_deref().unwrap_or("-"),
            rejection.retry_after_secs
        );
        rejection
    }
}

/// Default handler for messages on a WebSocket connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct SocketDenial;

impl DenialHandler for SocketDenial {
    fn on_denied(&self, ctx: &CallerContext, remaining_ms: u64) -> Rejection {
        let rejection = Rejection::too_many_requests(remaining_ms);
        warn!(
            "Rate limit exceeded for WebSocket: client={}, retry_after={}s",
            ctx.client_host(),
            rejection.retry_after_secs
        );
        rejection
    }
}
