//! # Config Repository
//!
//! The store settings edited from the back office, kept as one JSON row.
//! File and environment layering happens in the application; what is saved
//! here is the shop owner's edits.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use lustre_core::AppConfig;

#[derive(Debug, Clone)]
pub struct ConfigRepository {
    pool: SqlitePool,
}

impl ConfigRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ConfigRepository { pool }
    }

    /// The saved configuration, if any. Fields missing from older saves take
    /// their defaults.
    pub async fn load(&self) -> DbResult<Option<AppConfig>> {
        let json: Option<String> = sqlx::query_scalar("SELECT config FROM app_config WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Validates and saves, replacing what was there.
    pub async fn save(&self, config: &AppConfig) -> DbResult<()> {
        config.validate()?;
        let json = serde_json::to_string(config)?;

        sqlx::query(
            r#"
            INSERT INTO app_config (id, config, updated_at) VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET config = excluded.config, updated_at = excluded.updated_at
            "#,
        )
        .bind(json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(store = %config.store_name, "Configuration saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use crate::DbError;
    use lustre_core::GstPolicy;

    #[tokio::test]
    async fn test_save_and_load() {
        let db = test_db().await;
        assert!(db.config().load().await.unwrap().is_none());

        let mut config = AppConfig::default();
        config.store_name = "Kanak Jewellers".to_string();
        config.gst = GstPolicy::Flat { rate_bps: 300 };
        db.config().save(&config).await.unwrap();

        config.invoice_prefix = "KJ".to_string();
        db.config().save(&config).await.unwrap();

        let loaded = db.config().load().await.unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_invalid_config_not_saved() {
        let db = test_db().await;

        let mut config = AppConfig::default();
        config.invoice_prefix = String::new();
        assert!(matches!(db.config().save(&config).await, Err(DbError::Domain(_))));
        assert!(db.config().load().await.unwrap().is_none());
    }
}
