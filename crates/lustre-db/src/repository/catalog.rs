//! # Catalog Repository
//!
//! Materials, stones and the metal rate board.
//!
//! Metal rates are kept as history: every change is a new row with an
//! `effective_at`, and the board shows the latest row per
//! (material, purity). Writing the same (material, purity, effective_at)
//! twice overwrites the rate instead of adding a duplicate.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use lustre_core::validation;
use lustre_core::{Material, MetalRate, MetalRates, Stone, MAX_RATE_PAISE};

/// Latest row per (material, purity). Ties on `effective_at` go to the row
/// written last.
const LATEST_RATES_SQL: &str = r#"
    SELECT r.id, r.material_id, r.purity, r.rate_paise_per_g, r.effective_at
    FROM metal_rates r
    WHERE r.rowid = (
        SELECT r2.rowid FROM metal_rates r2
        WHERE r2.material_id = r.material_id AND r2.purity = r.purity
        ORDER BY r2.effective_at DESC, r2.rowid DESC
        LIMIT 1
    )
"#;

#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Materials
    // =========================================================================

    pub async fn insert_material(&self, material: &Material) -> DbResult<()> {
        debug!(id = %material.id, name = %material.name, "Inserting material");

        sqlx::query(
            "INSERT INTO materials (id, name, is_active, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&material.id)
        .bind(&material.name)
        .bind(material.is_active)
        .bind(material.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_materials(&self) -> DbResult<Vec<Material>> {
        let materials = sqlx::query_as::<_, Material>(
            "SELECT id, name, is_active, created_at FROM materials ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(materials)
    }

    pub async fn get_material(&self, id: &str) -> DbResult<Option<Material>> {
        let material = sqlx::query_as::<_, Material>(
            "SELECT id, name, is_active, created_at FROM materials WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(material)
    }

    // =========================================================================
    // Stones
    // =========================================================================

    /// Inserts a stone or, when the id exists, replaces its name and rate.
    pub async fn upsert_stone(&self, stone: &Stone) -> DbResult<()> {
        debug!(id = %stone.id, rate = stone.rate_paise_per_ct, "Upserting stone");

        sqlx::query(
            r#"
            INSERT INTO stones (id, name, rate_paise_per_ct, is_active, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                rate_paise_per_ct = excluded.rate_paise_per_ct,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&stone.id)
        .bind(&stone.name)
        .bind(stone.rate_paise_per_ct)
        .bind(stone.is_active)
        .bind(stone.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_stones(&self) -> DbResult<Vec<Stone>> {
        let stones = sqlx::query_as::<_, Stone>(
            r#"
            SELECT id, name, rate_paise_per_ct, is_active, updated_at
            FROM stones
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(stones)
    }

    pub async fn get_stone(&self, id: &str) -> DbResult<Option<Stone>> {
        let stone = sqlx::query_as::<_, Stone>(
            "SELECT id, name, rate_paise_per_ct, is_active, updated_at FROM stones WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stone)
    }

    // =========================================================================
    // Metal Rates
    // =========================================================================

    /// Records a per-gram rate for `material_id` at `purity`.
    ///
    /// Purity is stored uppercase ("22k" and "22K" are the same grade).
    pub async fn set_rate(
        &self,
        material_id: &str,
        purity: &str,
        rate_paise_per_g: i64,
        effective_at: DateTime<Utc>,
    ) -> DbResult<MetalRate> {
        validation::validate_purity(purity).map_err(lustre_core::CoreError::from)?;
        validation::validate_at_most("metal rate", rate_paise_per_g, MAX_RATE_PAISE)
            .map_err(lustre_core::CoreError::from)?;

        let purity = purity.trim().to_uppercase();

        sqlx::query(
            r#"
            INSERT INTO metal_rates (id, material_id, purity, rate_paise_per_g, effective_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(material_id, purity, effective_at) DO UPDATE SET
                rate_paise_per_g = excluded.rate_paise_per_g
            "#,
        )
        .bind(super::generate_id())
        .bind(material_id)
        .bind(&purity)
        .bind(rate_paise_per_g)
        .bind(effective_at)
        .execute(&self.pool)
        .await?;

        info!(
            material = %material_id,
            purity = %purity,
            rate_paise_per_g,
            "Metal rate updated"
        );

        let rate = sqlx::query_as::<_, MetalRate>(
            r#"
            SELECT id, material_id, purity, rate_paise_per_g, effective_at
            FROM metal_rates
            WHERE material_id = ?1 AND purity = ?2 AND effective_at = ?3
            "#,
        )
        .bind(material_id)
        .bind(&purity)
        .bind(effective_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(rate)
    }

    /// The latest rate for one material and purity.
    pub async fn latest_rate(
        &self,
        material_id: &str,
        purity: &str,
    ) -> DbResult<Option<MetalRate>> {
        let rate = sqlx::query_as::<_, MetalRate>(
            r#"
            SELECT id, material_id, purity, rate_paise_per_g, effective_at
            FROM metal_rates
            WHERE material_id = ?1 AND purity = ?2
            ORDER BY effective_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(material_id)
        .bind(purity.trim().to_uppercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(rate)
    }

    /// Like [`latest_rate`](Self::latest_rate) but a missing rate is an error:
    /// nothing can be priced without one.
    pub async fn require_rate(&self, material_id: &str, purity: &str) -> DbResult<MetalRate> {
        self.latest_rate(material_id, purity)
            .await?
            .ok_or_else(|| DbError::not_found("Metal rate", format!("{} {}", material_id, purity)))
    }

    /// The current rate board.
    pub async fn current_rates(&self) -> DbResult<MetalRates> {
        let sql = format!("{LATEST_RATES_SQL} ORDER BY r.material_id, r.purity");

        let rates = sqlx::query_as::<_, MetalRate>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(MetalRates::new(rates))
    }

    /// Rate history for one material and purity, newest first.
    pub async fn rate_history(
        &self,
        material_id: &str,
        purity: &str,
        limit: u32,
    ) -> DbResult<Vec<MetalRate>> {
        let rates = sqlx::query_as::<_, MetalRate>(
            r#"
            SELECT id, material_id, purity, rate_paise_per_g, effective_at
            FROM metal_rates
            WHERE material_id = ?1 AND purity = ?2
            ORDER BY effective_at DESC, rowid DESC
            LIMIT ?3
            "#,
        )
        .bind(material_id)
        .bind(purity.trim().to_uppercase())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{seed_gold, test_db};
    use chrono::Duration;

    #[tokio::test]
    async fn test_materials() {
        let db = test_db().await;
        seed_gold(&db).await;

        let all = db.catalog().list_materials().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(db.catalog().get_material("gold").await.unwrap().is_some());
        assert!(db.catalog().get_material("tin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stone_upsert() {
        let db = test_db().await;
        let mut stone = Stone {
            id: "ruby".to_string(),
            name: "Ruby".to_string(),
            rate_paise_per_ct: 2_000_000,
            is_active: true,
            updated_at: Utc::now(),
        };
        db.catalog().upsert_stone(&stone).await.unwrap();

        stone.rate_paise_per_ct = 2_500_000;
        db.catalog().upsert_stone(&stone).await.unwrap();

        let stones = db.catalog().list_stones().await.unwrap();
        assert_eq!(stones.len(), 1);
        assert_eq!(stones[0].rate_paise_per_ct, 2_500_000);
    }

    #[tokio::test]
    async fn test_latest_rate_wins() {
        let db = test_db().await;
        seed_gold(&db).await;
        let now = Utc::now();

        db.catalog()
            .set_rate("gold", "22k", 590_000, now - Duration::days(1))
            .await
            .unwrap();
        db.catalog().set_rate("gold", "22K", 600_000, now).await.unwrap();
        db.catalog().set_rate("gold", "18K", 490_000, now).await.unwrap();

        let latest = db.catalog().latest_rate("gold", "22k").await.unwrap().unwrap();
        assert_eq!(latest.rate_paise_per_g, 600_000);
        assert_eq!(latest.purity, "22K");

        let board = db.catalog().current_rates().await.unwrap();
        assert_eq!(board.rates.len(), 2);
        assert_eq!(board.rate_for("gold", "22K").unwrap().rate_paise_per_g, 600_000);

        let history = db.catalog().rate_history("gold", "22K", 10).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_same_instant_overwrites() {
        let db = test_db().await;
        seed_gold(&db).await;
        let at = Utc::now();

        db.catalog().set_rate("gold", "24K", 650_000, at).await.unwrap();
        let rate = db.catalog().set_rate("gold", "24K", 655_000, at).await.unwrap();
        assert_eq!(rate.rate_paise_per_g, 655_000);

        let history = db.catalog().rate_history("gold", "24K", 10).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_rate_validation() {
        let db = test_db().await;
        seed_gold(&db).await;

        assert!(matches!(
            db.catalog().set_rate("gold", "22K", -1, Utc::now()).await,
            Err(DbError::Domain(_))
        ));
        assert!(matches!(
            db.catalog().require_rate("gold", "14K").await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.catalog().set_rate("silver", "925", 9_000, Utc::now()).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }
}
