//! Rate Limit Rules
//!
//! Per-limiter settings: how many hits per window, how long the window is,
//! and optional overrides of the process-wide policies.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::admission::{DenialHandler, Identifier};

// == Rate Limit Rule ==
/// `times` hits per window. The window is the sum of its components,
/// truncated to whole seconds and never shorter than one second.
///
/// Each duration component accepts values down to -1; anything lower is
/// raised to -1.
#[derive(Clone)]
pub struct RateLimitRule {
    times: u32,
    milliseconds: i64,
    seconds: i64,
    minutes: i64,
    hours: i64,
    identifier: Option<Arc<dyn Identifier>>,
    callback: Option<Arc<dyn DenialHandler>>,
}

impl RateLimitRule {
    /// A rule allowing `times` hits per window (one second until a duration
    /// component is set).
    pub fn new(times: u32) -> Self {
        Self {
            times,
            milliseconds: 0,
            seconds: 0,
            minutes: 0,
            hours: 0,
            identifier: None,
            callback: None,
        }
    }

    pub fn milliseconds(mut self, milliseconds: i64) -> Self {
        self.milliseconds = milliseconds.max(-1);
        self
    }

    pub fn seconds(mut self, seconds: i64) -> Self {
        self.seconds = seconds.max(-1);
        self
    }

    pub fn minutes(mut self, minutes: i64) -> Self {
        self.minutes = minutes.max(-1);
        self
    }

    pub fn hours(mut self, hours: i64) -> Self {
        self.hours = hours.max(-1);
        self
    }

    /// Overrides the configured identifier for this limiter only.
    pub fn identifier(mut self, identifier: impl Identifier + 'static) -> Self {
        self.identifier = Some(Arc::new(identifier));
        self
    }

    /// Overrides the configured denial handler for this limiter only.
    pub fn callback(mut self, callback: impl DenialHandler + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn times(&self) -> u32 {
        self.times
    }

    /// Window length in seconds: `floor(ms / 1000) + s + 60*m + 3600*h`,
    /// clamped to at least 1.
    pub fn window_secs(&self) -> u64 {
        let total = self
            .milliseconds
            .div_euclid(1000)
            .saturating_add(self.seconds)
            .saturating_add(self.minutes.saturating_mul(60))
            .saturating_add(self.hours.saturating_mul(3600));
        total.max(1) as u64
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs())
    }

    pub(crate) fn identifier_override(&self) -> Option<&Arc<dyn Identifier>> {
        self.identifier.as_ref()
    }

    pub(crate) fn callback_override(&self) -> Option<&Arc<dyn DenialHandler>> {
        self.callback.as_ref()
    }
}

impl fmt::Debug for RateLimitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitRule")
            .field("times", &self.times)
            .field("window_secs", &self.window_secs())
            .field("custom_identifier", &self.identifier.is_some())
            .field("custom_callback", &self.callback.is_some())
            .finish()
    }
}
