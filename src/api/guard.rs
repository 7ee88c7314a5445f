//! Route Guard
//!
//! Middleware that runs a single-shot rate limit check before a route's
//! handler. Each guarded route gets its own [`RouteGuard`], whose endpoint
//! key was resolved when the router was built.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::ratelimit::{CallerContext, EndpointKey, RateLimiter, Verdict};

/// A limiter bound to one registered route.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    limiter: RateLimiter,
    endpoint: EndpointKey,
}

impl RouteGuard {
    pub fn new(limiter: RateLimiter, endpoint: EndpointKey) -> Self {
        Self { limiter, endpoint }
    }
}

/// Admits the request or answers with the denial handler's rejection.
///
/// A failed check (uninitialized config, store error) is a 500, never a
/// silent pass.
pub async fn rate_limit(State(guard): State<RouteGuard>, req: Request, next: Next) -> Response {
    let ctx = CallerContext::from_request(&req);

    match guard.limiter.check_request(guard.endpoint, &ctx) {
        Ok(Verdict::Allowed) => next.run(req).await,
        Ok(Verdict::Denied(rejection)) => rejection.into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}
