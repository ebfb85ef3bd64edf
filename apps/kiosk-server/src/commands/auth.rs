//! # Admin Login

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::{AuthState, DbState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Exchanges email and password for a Bearer access token.
///
/// Unknown email and wrong password give the same answer.
pub async fn login(
    State(db): State<DbState>,
    State(auth): State<AuthState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let admin = db.inner().admins().find_by_email(&request.email).await?;

    let admin = match admin {
        Some(admin) if admin.verify_password(&request.password) => admin,
        _ => {
            warn!(email = %request.email, "Failed admin login");
            return Err(ApiError::unauthorized("Invalid email or password"));
        }
    };

    let access_token = auth.jwt().generate_access_token(&admin)?;
    info!(admin_id = %admin.id, "Admin signed in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: auth.jwt().access_lifetime_secs(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_login_issues_usable_token() {
        let (app, state) = test_app().await;
        state
            .db
            .inner()
            .admins()
            .create_with_password("Owner@Matcha.cafe", "correct horse")
            .await
            .unwrap();

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/admin/login",
                json!({ "email": "owner@matcha.cafe", "password": "correct horse" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["expires_in"], 43200);

        let token = body["access_token"].as_str().unwrap();
        let (status, _) = send(&app, with_token(get("/api/admin/dashboard"), token)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_credentials_rejected() {
        let (app, state) = test_app().await;
        state
            .db
            .inner()
            .admins()
            .create_with_password("owner@matcha.cafe", "correct horse")
            .await
            .unwrap();

        for (email, password) in [("owner@matcha.cafe", "wrong password"), ("nobody@matcha.cafe", "correct horse")] {
            let (status, body) = send(
                &app,
                json_request(Method::POST, "/api/admin/login", json!({ "email": email, "password": password })),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["message"], "Invalid email or password");
        }
    }
}
