//! # Admin Account Repository
//!
//! Staff accounts for the dashboard. Emails are stored lowercased, so
//! sign-in is case-insensitive.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::password::{hash_password, verify_password};
use kiosk_core::validation::{validate_email, validate_password};

/// A dashboard account.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl AdminUser {
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }
}

#[derive(Debug, Clone)]
pub struct AdminRepository {
    pool: SqlitePool,
}

impl AdminRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AdminRepository { pool }
    }

    /// Stores an account with an already-hashed password.
    ///
    /// ## Errors
    /// - `DbError::Domain` for a malformed email
    /// - `DbError::UniqueViolation` when the email is taken
    pub async fn create(&self, email: &str, password_hash: &str) -> DbResult<AdminUser> {
        validate_email(email)?;
        let email = email.trim().to_lowercase();

        let user = AdminUser {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO admin_users (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("email", user.email.clone()),
                other => other,
            })?;

        info!(email = %user.email, "Admin account created");
        Ok(user)
    }

    /// Validates and hashes `password`, then stores the account.
    pub async fn create_with_password(&self, email: &str, password: &str) -> DbResult<AdminUser> {
        validate_password(password)?;
        let hash = hash_password(password)?;
        self.create(email, &hash).await
    }

    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<AdminUser>> {
        let user = sqlx::query_as::<_, AdminUser>(
            "SELECT id, email, password_hash, created_at FROM admin_users WHERE email = ?1",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::DbError;
    use kiosk_core::CoreError;

    #[tokio::test]
    async fn test_create_and_find_case_insensitive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admins = db.admins();

        let created = admins
            .create_with_password("Staff@Matcha.cafe", "correct horse")
            .await
            .unwrap();
        assert_eq!(created.email, "staff@matcha.cafe");

        let found = admins.find_by_email("STAFF@matcha.cafe").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(found.verify_password("correct horse"));
        assert!(!found.verify_password("incorrect horse"));
        assert_eq!(admins.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admins = db.admins();

        admins.create_with_password("staff@matcha.cafe", "correct horse").await.unwrap();
        let again = admins.create_with_password("staff@matcha.cafe", "another one").await;
        assert!(matches!(again, Err(DbError::UniqueViolation { ref field, .. }) if field == "email"));
    }

    #[tokio::test]
    async fn test_weak_input_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admins = db.admins();

        let short = admins.create_with_password("staff@matcha.cafe", "short").await;
        assert!(matches!(short, Err(DbError::Domain(CoreError::Validation(_)))));

        let bad_email = admins.create_with_password("staff", "correct horse").await;
        assert!(matches!(bad_email, Err(DbError::Domain(CoreError::Validation(_)))));
    }

    #[test]
    fn test_hash_is_not_serialized() {
        let user = super::AdminUser {
            id: "a".to_string(),
            email: "staff@matcha.cafe".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            created_at: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
    }
}
