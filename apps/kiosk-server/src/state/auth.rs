//! # Auth State
//!
//! Shared [`JwtManager`] for the login handler and the
//! [`AdminSession`](crate::auth::AdminSession) extractor.

use std::sync::Arc;

use crate::auth::JwtManager;
use crate::config::AuthSettings;

#[derive(Debug, Clone)]
pub struct AuthState {
    jwt: Arc<JwtManager>,
}

impl AuthState {
    pub fn new(settings: &AuthSettings) -> Self {
        AuthState {
            jwt: Arc::new(JwtManager::new(
                settings.jwt_secret.clone(),
                settings.token_lifetime_secs,
            )),
        }
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }
}
