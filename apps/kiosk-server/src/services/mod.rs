//! # Outbound Services
//!
//! HTTP clients for the two external collaborators:
//!
//! - [`mailer`] - Resend, for the daily summary email
//! - [`analytics`] - PostHog, for the kiosk funnel counts
//!
//! Base URLs come from configuration so tests can point them at a local
//! stand-in server.

pub mod analytics;
pub mod mailer;

pub use analytics::PostHogClient;
pub use mailer::ResendMailer;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// API key (or recipient list) absent from configuration.
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    /// Provider answered with a non-success status.
    #[error("{provider} returned {status}: {detail}")]
    Upstream {
        provider: &'static str,
        status: u16,
        detail: String,
    },

    /// Transport failure or undecodable response.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
