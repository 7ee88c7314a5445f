//! Rate Limiter
//!
//! Fixed-window admission checks against a shared [`CacheStore`]. The
//! counting step runs inside [`CacheStore::compute`], so concurrent checks
//! on one key are strictly serialized and never admit more than `times`
//! hits per window.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::admission::{AdmissionConfig, AdmissionSettings, DenialHandler, Identifier, Rejection};
use crate::cache::CacheStore;
use crate::error::AdmissionResult;
use crate::ratelimit::{
    count_hit, message_key, request_key, CallerContext, Decision, EndpointKey, RateLimitRecord,
    RateLimitRule,
};

/// Store type shared by every limiter in the process.
pub type LimiterStore = CacheStore<RateLimitRecord>;

// == Verdict ==
/// Result of an admission check as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    /// Denied; the rejection comes from the configured denial handler
    Denied(Rejection),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }
}

// == Rate Limiter ==
/// One limiter: a rule bound to the shared store and admission config.
///
/// Cheap to clone. Overrides in the rule win over the configured policies;
/// the configured ones are looked up on every check, not at construction.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    rule: Arc<RateLimitRule>,
    store: Arc<LimiterStore>,
    admission: Arc<AdmissionConfig>,
}

impl RateLimiter {
    pub fn new(
        rule: RateLimitRule,
        store: Arc<LimiterStore>,
        admission: Arc<AdmissionConfig>,
    ) -> Self {
        let limiter = Self {
            rule: Arc::new(rule),
            store,
            admission,
        };
        if limiter.window_exceeds_store_ttl() {
            warn!(
                "Rate limit window {:?} is longer than the store TTL {:?}; denied callers may be reset early",
                limiter.rule.window(),
                limiter.store.policy().ttl()
            );
        }
        limiter
    }

    pub fn rule(&self) -> &RateLimitRule {
        &self.rule
    }

    /// True when counter records can expire before their window ends.
    ///
    /// Only allowed hits rewrite a record and refresh its TTL, so a caller
    /// who keeps getting denied loses the record once the store TTL elapses.
    pub fn window_exceeds_store_ttl(&self) -> bool {
        self.store
            .policy()
            .ttl()
            .is_some_and(|ttl| self.rule.window() > ttl)
    }

    // == Hit ==
    /// Counts one hit against `key`. Does not consult the admission config.
    pub fn hit(&self, key: &str) -> AdmissionResult<Decision> {
        let times = self.rule.times();
        let window_ms = self.rule.window_secs().saturating_mul(1000);

        let decision = self
            .store
            .compute(key, |current, now| count_hit(current, now, times, window_ms))
            .map_err(|err| {
                error!("Rate limiter error for key={}: {}", key, err);
                err
            })?;

        match decision {
            Decision::Allow => debug!("Rate limiter ALLOW: key={}, limit={}", key, times),
            Decision::Deny { remaining_ms } => info!(
                "Rate limiter LIMIT EXCEEDED: key={}, limit={}, remaining={}ms",
                key, times, remaining_ms
            ),
        }
        Ok(decision)
    }

    // == Request Check ==
    /// Single-shot check for the guard at `endpoint`.
    ///
    /// # Errors
    /// `NotInitialized` when the admission config is inactive, `Cache` when
    /// the store fails. A denial is `Ok(Verdict::Denied(_))`.
    pub fn check_request(
        &self,
        endpoint: EndpointKey,
        ctx: &CallerContext,
    ) -> AdmissionResult<Verdict> {
        let settings = self.settings()?;
        let key = request_key(&settings.prefix, &self.identity(&settings, ctx), endpoint);
        debug!(
            "HTTP rate limit check: client={}, path={}, key={}",
            ctx.client_host(),
            ctx.path,
            key
        );

        let handler = self.rule.callback_override().unwrap_or(&settings.http_callback);
        self.decide(&key, ctx, handler.as_ref())
    }

    // == Message Check ==
    /// Repeated check for one message on a long-lived connection.
    /// `sub_context` separates independent counters within the connection.
    pub fn check_message(
        &self,
        ctx: &CallerContext,
        sub_context: &str,
    ) -> AdmissionResult<Verdict> {
        let settings = self.settings()?;
        let key = message_key(&settings.prefix, &self.identity(&settings, ctx), sub_context);
        debug!(
            "WebSocket rate limit check: client={}, key={}",
            ctx.client_host(),
            key
        );

        let handler = self.rule.callback_override().unwrap_or(&settings.ws_callback);
        self.decide(&key, ctx, handler.as_ref())
    }

    /// The counter key a request check at `endpoint` would use.
    pub fn request_key(&self, endpoint: EndpointKey, ctx: &CallerContext) -> AdmissionResult<String> {
        let settings = self.settings()?;
        Ok(request_key(&settings.prefix, &self.identity(&settings, ctx), endpoint))
    }

    fn settings(&self) -> AdmissionResult<Arc<AdmissionSettings>> {
        self.admission.active().map_err(|err| {
            error!("Rate limit check before admission config init: {}", err);
            err
        })
    }

    fn identity(&self, settings: &AdmissionSettings, ctx: &CallerContext) -> String {
        let identifier: &dyn Identifier = match self.rule.identifier_override() {
            Some(custom) => custom.as_ref(),
            None => settings.identifier.as_ref(),
        };
        identifier.identify(ctx)
    }

    fn decide(
        &self,
        key: &str,
        ctx: &CallerContext,
        handler: &dyn DenialHandler,
    ) -> AdmissionResult<Verdict> {
        match self.hit(key)? {
            Decision::Allow => Ok(Verdict::Allowed),
            Decision::Deny { remaining_ms } => {
                Ok(Verdict::Denied(handler.on_denied(ctx, remaining_ms)))
            }
        }
    }
}
