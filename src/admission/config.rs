//! Admission Configuration
//!
//! Process-wide rate-limit settings with an explicit init/close lifecycle.
//! The config is shared as `Arc<AdmissionConfig>` and read on every check,
//! so limiters built before `init` pick up the settings once it has run.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::admission::{ClientPathIdentifier, DenialHandler, HttpDenial, Identifier, SocketDenial};
use crate::error::{AdmissionError, AdmissionResult};

/// Key prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "rate-limiter";

// == Admission Settings ==
/// Prefix plus the default identity and denial policies.
#[derive(Clone)]
pub struct AdmissionSettings {
    pub prefix: String,
    pub identifier: Arc<dyn Identifier>,
    pub http_callback: Arc<dyn DenialHandler>,
    pub ws_callback: Arc<dyn DenialHandler>,
}

impl AdmissionSettings {
    /// Settings with the given prefix and the default policies.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            identifier: Arc::new(ClientPathIdentifier),
            http_callback: Arc::new(HttpDenial),
            ws_callback: Arc::new(SocketDenial),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Identifier + 'static) -> Self {
        self.identifier = Arc::new(identifier);
        self
    }

    pub fn with_http_callback(mut self, callback: impl DenialHandler + 'static) -> Self {
        self.http_callback = Arc::new(callback);
        self
    }

    pub fn with_ws_callback(mut self, callback: impl DenialHandler + 'static) -> Self {
        self.ws_callback = Arc::new(callback);
        self
    }
}

impl Default for AdmissionSettings {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl fmt::Debug for AdmissionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionSettings")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

// == Admission Config ==
/// Holds the active settings, or nothing while uninitialized or closed.
#[derive(Debug, Default)]
pub struct AdmissionConfig {
    active: RwLock<Option<Arc<AdmissionSettings>>>,
}

impl AdmissionConfig {
    /// Creates an inactive config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `settings` and marks the config active. Calling it again
    /// replaces the previous settings.
    pub fn init(&self, settings: AdmissionSettings) {
        info!("Admission config initialized: prefix={}", settings.prefix);
        *self.active.write() = Some(Arc::new(settings));
    }

    /// Marks the config inactive. Closing an inactive config is a no-op.
    pub fn close(&self) {
        if self.active.write().take().is_some() {
            info!("Admission config closed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.read().is_some()
    }

    /// Returns the active settings.
    ///
    /// # Errors
    /// `AdmissionError::NotInitialized` if `init` has not run or `close` has.
    pub fn active(&self) -> AdmissionResult<Arc<AdmissionSettings>> {
        self.active
            .read()
            .clone()
            .ok_or(AdmissionError::NotInitialized)
    }
}
