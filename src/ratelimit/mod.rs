//! Rate Limit Module
//!
//! Fixed-window rate limiting on top of the cache store, for one-shot HTTP
//! requests and for repeated per-message checks on a connection.

mod context;
mod key;
mod limiter;
mod record;
mod rule;

pub use context::{CallerContext, FORWARDED_FOR};
pub use key::{message_key, request_key, EndpointKey, RouteRegistry};
pub use limiter::{LimiterStore, RateLimiter, Verdict};
pub use record::{count_hit, Decision, RateLimitRecord};
pub use rule::RateLimitRule;
