//! # Product Repository
//!
//! Database operations for jewelry products.
//!
//! ## Key Operations
//! - Name/SKU search
//! - CRUD operations with metal composition
//! - Stock deltas and the low stock report
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Search Works                                     │
//! │                                                                         │
//! │  User types: "bangle"                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Escape % and _, wrap as %bangle%                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │ products (is_active = 1)                │                           │
//! │  │                                         │                           │
//! │  │ BNG-001 | Antique Bangle 22K           │ ← name LIKE               │
//! │  │ BNG-002 | Kada Bangle Pair             │ ← name LIKE               │
//! │  │ RNG-014 | Solitaire Ring               │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Results ordered: exact SKU first, then by name                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use lustre_core::{Product, ProductMaterial};

const PRODUCT_COLUMNS: &str = r#"
    id, sku, name, description, category, material_id, purity,
    gross_weight_mg, less_weight_mg, making_rate_paise_per_g,
    stone_id, cw_weight_cents, va_charges_paise, discount_bps,
    current_stock, image_url, is_active, created_at, updated_at
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let results = repo.search("bangle", 20).await?;
/// let product = repo.get_by_sku("BNG-001").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products by name or SKU.
    ///
    /// An empty query lists active products by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let pattern = format!("%{}%", escape_like(query));

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1
              AND (name LIKE ?1 ESCAPE '\' OR sku LIKE ?1 ESCAPE '\')
            ORDER BY (sku = ?2 COLLATE NOCASE) DESC, name
            LIMIT ?3
            "#
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(&pattern)
            .bind(query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Active products in a category, e.g. every "Bangle".
    pub async fn list_by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1 AND category = ?1 COLLATE NOCASE
            ORDER BY name
            "#
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its ID, with its metal composition.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found (active or not)
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match product {
            Some(mut product) => {
                product.materials = self.materials(&product.id).await?;
                Ok(Some(product))
            }
            None => Ok(None),
        }
    }

    /// Gets a product by its SKU (case-sensitive).
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        match product {
            Some(mut product) => {
                product.materials = self.materials(&product.id).await?;
                Ok(Some(product))
            }
            None => Ok(None),
        }
    }

    /// Metal composition of a product.
    pub async fn materials(&self, product_id: &str) -> DbResult<Vec<ProductMaterial>> {
        let rows = sqlx::query_as::<_, ProductMaterial>(
            r#"
            SELECT product_id, material_id, purity, weight_mg
            FROM product_materials
            WHERE product_id = ?1
            ORDER BY weight_mg DESC, material_id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Inserts a new product and its composition.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    /// * `Err(DbError::ForeignKeyViolation)` - unknown material or stone
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(sku = %product.sku, "Inserting product");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, description, category, material_id, purity,
                gross_weight_mg, less_weight_mg, making_rate_paise_per_g,
                stone_id, cw_weight_cents, va_charges_paise, discount_bps,
                current_stock, image_url, is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18, ?19
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.material_id)
        .bind(&product.purity)
        .bind(product.gross_weight_mg)
        .bind(product.less_weight_mg)
        .bind(product.making_rate_paise_per_g)
        .bind(&product.stone_id)
        .bind(product.cw_weight_cents)
        .bind(product.va_charges_paise)
        .bind(product.discount_bps)
        .bind(product.current_stock)
        .bind(&product.image_url)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(err) = result {
            return Err(match DbError::from(err) {
                DbError::UniqueViolation { field, .. } => {
                    DbError::duplicate(field, product.sku.clone())
                }
                other => other,
            });
        }

        write_materials(&mut tx, &product.id, &product.materials).await?;
        tx.commit().await?;

        Ok(product.clone())
    }

    /// Updates an existing product, replacing its composition.
    ///
    /// Stock is not touched here; use [`ProductRepository::update_stock`].
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                name = ?3,
                description = ?4,
                category = ?5,
                material_id = ?6,
                purity = ?7,
                gross_weight_mg = ?8,
                less_weight_mg = ?9,
                making_rate_paise_per_g = ?10,
                stone_id = ?11,
                cw_weight_cents = ?12,
                va_charges_paise = ?13,
                discount_bps = ?14,
                image_url = ?15,
                is_active = ?16,
                updated_at = ?17
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.material_id)
        .bind(&product.purity)
        .bind(product.gross_weight_mg)
        .bind(product.less_weight_mg)
        .bind(product.making_rate_paise_per_g)
        .bind(&product.stone_id)
        .bind(product.cw_weight_cents)
        .bind(product.va_charges_paise)
        .bind(product.discount_bps)
        .bind(&product.image_url)
        .bind(product.is_active)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        sqlx::query("DELETE FROM product_materials WHERE product_id = ?1")
            .bind(&product.id)
            .execute(&mut *tx)
            .await?;
        write_materials(&mut tx, &product.id, &product.materials).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Adjusts stock by `delta` (negative for sales, positive for restocking).
    ///
    /// Stock never goes below zero: a delta that would do so fails with
    /// [`DbError::Conflict`] and nothing changes.
    pub async fn update_stock(&self, id: &str, delta: i64) -> DbResult<i64> {
        debug!(id = %id, delta = %delta, "Updating stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET current_stock = current_stock + ?2,
                updated_at = ?3
            WHERE id = ?1 AND current_stock + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current: Option<i64> =
                sqlx::query_scalar("SELECT current_stock FROM products WHERE id = ?1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;

            return Err(match current {
                None => DbError::not_found("Product", id),
                Some(stock) => DbError::Conflict(format!(
                    "stock for {} is {}, cannot apply {}",
                    id, stock, delta
                )),
            });
        }

        let stock: i64 = sqlx::query_scalar("SELECT current_stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(stock)
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Invoices keep referencing the row, so it is never removed.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Active products with stock at or below `threshold`, emptiest first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1 AND current_stock <= ?1
            ORDER BY current_stock, name
            "#
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn write_materials(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
    materials: &[ProductMaterial],
) -> DbResult<()> {
    for material in materials {
        sqlx::query(
            r#"
            INSERT INTO product_materials (product_id, material_id, purity, weight_mg)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(product_id)
        .bind(&material.material_id)
        .bind(&material.purity)
        .bind(material.weight_mg)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_ring, ring, seed_gold, test_db};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        seed_gold(&db).await;

        let mut product = ring("RNG-001");
        product.materials = vec![ProductMaterial {
            product_id: product.id.clone(),
            material_id: "gold".to_string(),
            purity: "22K".to_string(),
            weight_mg: 10_000,
        }];
        db.products().insert(&product).await.unwrap();

        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.sku, "RNG-001");
        assert_eq!(loaded.gross_weight_mg, 10_000);
        assert_eq!(loaded.materials.len(), 1);

        let by_sku = db.products().get_by_sku("RNG-001").await.unwrap().unwrap();
        assert_eq!(by_sku.id, product.id);

        assert!(db.products().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = test_db().await;
        seed_gold(&db).await;
        insert_ring(&db, "RNG-001").await;

        let err = db.products().insert(&ring("RNG-001")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "RNG-001"));
    }

    #[tokio::test]
    async fn test_unknown_material_rejected() {
        let db = test_db().await;

        let err = db.products().insert(&ring("RNG-001")).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_search_by_name_and_sku() {
        let db = test_db().await;
        seed_gold(&db).await;

        let mut bangle = ring("BNG-001");
        bangle.name = "Antique Bangle".to_string();
        bangle.category = "Bangle".to_string();
        db.products().insert(&bangle).await.unwrap();
        insert_ring(&db, "RNG-001").await;

        let found = db.products().search("bangle", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sku, "BNG-001");

        let found = db.products().search("rng-001", 10).await.unwrap();
        assert_eq!(found.len(), 1);

        let all = db.products().search("  ", 10).await.unwrap();
        assert_eq!(all.len(), 2);

        // Wildcards are literal.
        assert!(db.products().search("%", 10).await.unwrap().is_empty());

        let bangles = db.products().list_by_category("bangle").await.unwrap();
        assert_eq!(bangles.len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let db = test_db().await;
        seed_gold(&db).await;
        let mut product = insert_ring(&db, "RNG-001").await;

        product.name = "Solitaire Ring".to_string();
        product.less_weight_mg = 500;
        db.products().update(&product).await.unwrap();

        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Solitaire Ring");
        assert_eq!(loaded.net_weight_mg(), 9_500);

        let mut missing = ring("RNG-404");
        missing.id = "missing".to_string();
        assert!(matches!(
            db.products().update(&missing).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_stock_never_negative() {
        let db = test_db().await;
        seed_gold(&db).await;
        let product = insert_ring(&db, "RNG-001").await;

        assert_eq!(db.products().update_stock(&product.id, -2).await.unwrap(), 1);
        assert!(matches!(
            db.products().update_stock(&product.id, -2).await,
            Err(DbError::Conflict(_))
        ));
        assert_eq!(db.products().update_stock(&product.id, 5).await.unwrap(), 6);
        assert!(matches!(
            db.products().update_stock("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_soft_delete_and_low_stock() {
        let db = test_db().await;
        seed_gold(&db).await;
        let a = insert_ring(&db, "RNG-001").await;
        let b = insert_ring(&db, "RNG-002").await;

        db.products().update_stock(&a.id, -3).await.unwrap();
        let low = db.products().low_stock(1).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, a.id);

        db.products().soft_delete(&b.id).await.unwrap();
        assert_eq!(db.products().count().await.unwrap(), 1);
        assert!(db.products().search("RNG-002", 10).await.unwrap().is_empty());

        let kept = db.products().get_by_id(&b.id).await.unwrap().unwrap();
        assert!(!kept.is_active);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), r"50\%\_off");
        assert_eq!(escape_like("ring"), "ring");
    }
}
