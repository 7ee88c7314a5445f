//! Admission Module
//!
//! Process-wide rate-limit configuration and the pluggable identity and
//! denial policies it carries.

mod config;
mod policy;

pub use config::{AdmissionConfig, AdmissionSettings, DEFAULT_PREFIX};
pub use policy::{
    ClientPathIdentifier, DenialHandler, HttpDenial, Identifier, Rejection, SocketDenial,
};
