//! # Customer Repository
//!
//! Customers are keyed by phone number: the counter looks people up by
//! phone, so saving a customer with a known phone updates that record.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use lustre_core::validation;
use lustre_core::{CoreError, Customer, Product};

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Creates a customer or updates the one with the same phone number.
    ///
    /// The phone is stored as its bare 10 digits.
    pub async fn upsert(&self, name: &str, phone: &str, email: Option<&str>) -> DbResult<Customer> {
        validation::validate_name("customer name", name, 120).map_err(CoreError::from)?;
        let phone = validation::normalize_phone(phone).map_err(CoreError::from)?;
        let email = email.map(str::trim).filter(|e| !e.is_empty());
        if let Some(email) = email {
            validation::validate_email(email).map_err(CoreError::from)?;
        }

        debug!(phone = %phone, "Upserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, phone, email, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(phone) DO UPDATE SET
                name = excluded.name,
                email = COALESCE(excluded.email, customers.email)
            "#,
        )
        .bind(super::generate_id())
        .bind(name.trim())
        .bind(&phone)
        .bind(email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_by_phone(&phone)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", phone))
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone, email, created_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Looks a customer up by phone in any accepted format.
    pub async fn get_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let Ok(phone) = validation::normalize_phone(phone) else {
            return Ok(None);
        };

        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone, email, created_at FROM customers WHERE phone = ?1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Name or phone substring search.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let pattern = format!("%{}%", query.trim());

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, email, created_at
            FROM customers
            WHERE name LIKE ?1 OR phone LIKE ?1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Adds the product to the wishlist, or removes it if already there.
    ///
    /// Returns `true` when the product is now on the wishlist.
    pub async fn toggle_wishlist(&self, customer_id: &str, product_id: &str) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM wishlist WHERE customer_id = ?1 AND product_id = ?2")
            .bind(customer_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            sqlx::query(
                "INSERT INTO wishlist (customer_id, product_id, added_at) VALUES (?1, ?2, ?3)",
            )
                .bind(customer_id)
                .bind(product_id)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let saved = removed == 0;
        debug!(customer = %customer_id, product = %product_id, saved, "Wishlist toggled");
        Ok(saved)
    }

    /// Active wishlisted products, most recently added first.
    pub async fn wishlist(&self, customer_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.id, p.sku, p.name, p.description, p.category, p.material_id, p.purity,
                   p.gross_weight_mg, p.less_weight_mg, p.making_rate_paise_per_g,
                   p.stone_id, p.cw_weight_cents, p.va_charges_paise, p.discount_bps,
                   p.current_stock, p.image_url, p.is_active, p.created_at, p.updated_at
            FROM wishlist w
            INNER JOIN products p ON p.id = w.product_id
            WHERE w.customer_id = ?1 AND p.is_active = 1
            ORDER BY w.added_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_ring, seed_gold, test_db};

    #[tokio::test]
    async fn test_upsert_by_phone() {
        let db = test_db().await;

        let first = db
            .customers()
            .upsert("Asha Rao", "+91 98765-43210", Some("asha@example.com"))
            .await
            .unwrap();
        assert_eq!(first.phone, "9876543210");

        let second = db.customers().upsert("Asha R.", "09876543210", None).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.name, "Asha R.");
        assert_eq!(second.email.as_deref(), Some("asha@example.com"));

        let found = db.customers().search("asha", 10).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_validates() {
        let db = test_db().await;

        assert!(matches!(
            db.customers().upsert("Asha", "123", None).await,
            Err(DbError::Domain(_))
        ));
        assert!(matches!(
            db.customers().upsert("", "9876543210", None).await,
            Err(DbError::Domain(_))
        ));
        assert!(db.customers().get_by_phone("not a phone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wishlist_toggle() {
        let db = test_db().await;
        seed_gold(&db).await;
        let ring = insert_ring(&db, "RNG-001").await;
        let customer = db.customers().upsert("Asha", "9876543210", None).await.unwrap();

        assert!(db.customers().toggle_wishlist(&customer.id, &ring.id).await.unwrap());
        let list = db.customers().wishlist(&customer.id).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].sku, "RNG-001");

        assert!(!db.customers().toggle_wishlist(&customer.id, &ring.id).await.unwrap());
        assert!(db.customers().wishlist(&customer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wishlist_unknown_product() {
        let db = test_db().await;
        let customer = db.customers().upsert("Asha", "9876543210", None).await.unwrap();

        assert!(matches!(
            db.customers().toggle_wishlist(&customer.id, "missing").await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }
}
