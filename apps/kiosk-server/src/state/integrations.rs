//! # Integrations State
//!
//! Outbound clients built from configuration. A client is absent when its
//! API key is not configured; the handler that needs it then answers with a
//! configuration error instead of the server refusing to start.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::{PostHogClient, ResendMailer, ServiceError, ServiceResult};

#[derive(Debug, Clone, Default)]
pub struct IntegrationsState {
    mailer: Option<Arc<ResendMailer>>,
    analytics: Option<Arc<PostHogClient>>,
}

impl IntegrationsState {
    pub fn from_config(config: &ServerConfig) -> Self {
        IntegrationsState {
            mailer: ResendMailer::from_settings(&config.resend).map(Arc::new),
            analytics: PostHogClient::from_settings(&config.posthog).map(Arc::new),
        }
    }

    pub fn with_clients(mailer: Option<ResendMailer>, analytics: Option<PostHogClient>) -> Self {
        IntegrationsState {
            mailer: mailer.map(Arc::new),
            analytics: analytics.map(Arc::new),
        }
    }

    pub fn mailer(&self) -> ServiceResult<&ResendMailer> {
        self.mailer
            .as_deref()
            .ok_or(ServiceError::NotConfigured("RESEND_API_KEY"))
    }

    pub fn analytics(&self) -> ServiceResult<&PostHogClient> {
        self.analytics
            .as_deref()
            .ok_or(ServiceError::NotConfigured("POSTHOG_API_KEY"))
    }
}
