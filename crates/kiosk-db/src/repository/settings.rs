//! # Settings Repository
//!
//! The single `app_settings` row. Reads fall back to the house defaults
//! until staff save something.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::changes::{ChangeFeed, ChangeOp, ChangeTable, TableChange};
use crate::error::DbResult;
use kiosk_core::{validation, AppSettings, SettingsPatch};

const SETTINGS_COLUMNS: &str = "sweets_coming_soon, large_size_extra_cents, extra_collagen_price_cents, \
     extra_ashwagandha_price_cents, extra_honey_price_cents, updated_at";

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
    changes: ChangeFeed,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool, changes: ChangeFeed) -> Self {
        SettingsRepository { pool, changes }
    }

    /// Current settings, or defaults when the row is absent.
    pub async fn get(&self) -> DbResult<AppSettings> {
        let mut conn = self.pool.acquire().await?;
        fetch_settings(&mut conn).await
    }

    /// Applies a partial update and returns the stored result.
    ///
    /// Prices in the patch are clamped at zero; values above
    /// `MAX_PRICE_CENTS` are rejected and nothing is written.
    pub async fn update(&self, patch: &SettingsPatch) -> DbResult<AppSettings> {
        let mut tx = self.pool.begin().await?;

        let mut settings = fetch_settings(&mut tx).await?;
        patch.apply(&mut settings);
        validation::validate_settings(&settings)?;
        settings.updated_at = Some(Utc::now());
        write_settings(&mut tx, &settings).await?;

        tx.commit().await?;

        info!(
            large_size_extra_cents = settings.large_size_extra_cents,
            sweets_coming_soon = settings.sweets_coming_soon,
            "Settings updated"
        );
        self.publish();
        Ok(settings)
    }

    /// Writes a full settings value (the seed binary stores the defaults this way).
    pub async fn save(&self, settings: &AppSettings) -> DbResult<AppSettings> {
        let mut stored = settings.clone();
        stored.large_size_extra_cents = stored.large_size_extra_cents.max(0);
        stored.extra_collagen_price_cents = stored.extra_collagen_price_cents.max(0);
        stored.extra_ashwagandha_price_cents = stored.extra_ashwagandha_price_cents.max(0);
        stored.extra_honey_price_cents = stored.extra_honey_price_cents.max(0);
        validation::validate_settings(&stored)?;
        stored.updated_at = Some(Utc::now());

        let mut conn = self.pool.acquire().await?;
        write_settings(&mut conn, &stored).await?;

        self.publish();
        Ok(stored)
    }

    fn publish(&self) {
        self.changes
            .publish(TableChange::new(ChangeTable::Settings, ChangeOp::Update, None));
    }
}

pub(crate) async fn fetch_settings(conn: &mut SqliteConnection) -> DbResult<AppSettings> {
    let sql = format!("SELECT {} FROM app_settings WHERE id = 1", SETTINGS_COLUMNS);
    let settings = sqlx::query_as::<_, AppSettings>(&sql)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(settings.unwrap_or_default())
}

async fn write_settings(conn: &mut SqliteConnection, settings: &AppSettings) -> DbResult<()> {
    debug!("Writing settings row");

    sqlx::query(
        r#"
        INSERT INTO app_settings (
            id, sweets_coming_soon, large_size_extra_cents, extra_collagen_price_cents,
            extra_ashwagandha_price_cents, extra_honey_price_cents, updated_at
        ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT (id) DO UPDATE SET
            sweets_coming_soon = excluded.sweets_coming_soon,
            large_size_extra_cents = excluded.large_size_extra_cents,
            extra_collagen_price_cents = excluded.extra_collagen_price_cents,
            extra_ashwagandha_price_cents = excluded.extra_ashwagandha_price_cents,
            extra_honey_price_cents = excluded.extra_honey_price_cents,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(settings.sweets_coming_soon)
    .bind(settings.large_size_extra_cents)
    .bind(settings.extra_collagen_price_cents)
    .bind(settings.extra_ashwagandha_price_cents)
    .bind(settings.extra_honey_price_cents)
    .bind(settings.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::DbError;
    use kiosk_core::{AppSettings, CoreError, SettingsPatch, MAX_PRICE_CENTS};

    #[tokio::test]
    async fn test_defaults_when_row_absent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = db.settings().get().await.unwrap();
        assert_eq!(settings, AppSettings::default());
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let updated = db
            .settings()
            .update(&SettingsPatch {
                sweets_coming_soon: Some(false),
                large_size_extra_cents: Some(125),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(updated.updated_at.is_some());

        let stored = db.settings().get().await.unwrap();
        assert!(!stored.sweets_coming_soon);
        assert_eq!(stored.large_size_extra_cents, 125);
        assert_eq!(stored.extra_collagen_price_cents, 150);

        db.settings()
            .update(&SettingsPatch {
                extra_honey_price_cents: Some(-20),
                ..Default::default()
            })
            .await
            .unwrap();
        let stored = db.settings().get().await.unwrap();
        assert_eq!(stored.extra_honey_price_cents, 0);
        assert_eq!(stored.large_size_extra_cents, 125);
    }

    #[tokio::test]
    async fn test_oversized_price_rejected_without_write() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let result = db
            .settings()
            .update(&SettingsPatch {
                sweets_coming_soon: Some(false),
                large_size_extra_cents: Some(i64::MAX),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(DbError::Domain(CoreError::Validation(_)))));
        assert_eq!(db.settings().get().await.unwrap(), AppSettings::default());

        let mut settings = AppSettings::default();
        settings.extra_collagen_price_cents = MAX_PRICE_CENTS + 1;
        assert!(db.settings().save(&settings).await.is_err());
    }

    #[tokio::test]
    async fn test_save_publishes_change() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut rx = db.changes().subscribe();

        db.settings().save(&AppSettings::default()).await.unwrap();

        let change = rx.recv().await.unwrap();
        assert_eq!(change.table, crate::changes::ChangeTable::Settings);
    }
}
