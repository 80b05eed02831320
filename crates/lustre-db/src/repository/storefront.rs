//! # Storefront Repository
//!
//! Themed collections (with their ordered product lists) and the home-page
//! carousel. Ordering rules come from `lustre_core::storefront`; this module
//! loads the list, lets the core reorder it and writes every position back
//! in one transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use lustre_core::storefront::{move_to, CarouselItem, Positioned, ThemedCollection};

const COLLECTION_COLUMNS: &str =
    "id, name, description, image_url, position, is_active, created_at, updated_at";

const CAROUSEL_COLUMNS: &str =
    "id, title, subtitle, image_url, link_target, position, is_active, created_at";

#[derive(Debug, Clone)]
pub struct StorefrontRepository {
    pool: SqlitePool,
}

impl StorefrontRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StorefrontRepository { pool }
    }

    // =========================================================================
    // Themed Collections
    // =========================================================================

    /// Creates a collection at the end of the list.
    pub async fn create_collection(
        &self,
        collection: &ThemedCollection,
    ) -> DbResult<ThemedCollection> {
        collection.validate()?;

        let mut tx = self.pool.begin().await?;

        let position: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(position) + 1, 0) FROM themed_collections")
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query(
            r#"
            INSERT INTO themed_collections (
                id, name, description, image_url, position, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&collection.id)
        .bind(&collection.name)
        .bind(&collection.description)
        .bind(&collection.image_url)
        .bind(position)
        .bind(collection.is_active)
        .bind(collection.created_at)
        .bind(collection.updated_at)
        .execute(&mut *tx)
        .await?;

        for (idx, product_id) in collection.product_ids.iter().enumerate() {
            insert_collection_product(&mut tx, &collection.id, product_id, idx as i64).await?;
        }

        tx.commit().await?;

        info!(id = %collection.id, name = %collection.name, "Collection created");

        let mut created = collection.clone();
        created.position = position;
        Ok(created)
    }

    /// Updates name, description, image and active flag.
    pub async fn update_collection(&self, collection: &ThemedCollection) -> DbResult<()> {
        collection.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE themed_collections
            SET name = ?2, description = ?3, image_url = ?4, is_active = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&collection.id)
        .bind(&collection.name)
        .bind(&collection.description)
        .bind(&collection.image_url)
        .bind(collection.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Collection", &collection.id));
        }
        Ok(())
    }

    pub async fn get_collection(&self, id: &str) -> DbResult<Option<ThemedCollection>> {
        let mut conn = self.pool.acquire().await?;
        load_collection(&mut conn, id).await
    }

    /// Collections in display order, each with its products.
    pub async fn list_collections(&self, active_only: bool) -> DbResult<Vec<ThemedCollection>> {
        let mut conn = self.pool.acquire().await?;
        let mut collections = collections_in_order(&mut conn, active_only).await?;

        for collection in &mut collections {
            collection.product_ids = product_ids(&mut conn, &collection.id).await?;
        }
        Ok(collections)
    }

    /// Deletes a collection and closes the gap in positions.
    pub async fn delete_collection(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM themed_collections WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Collection", id));
        }

        let mut remaining = collections_in_order(&mut tx, false).await?;
        lustre_core::storefront::renumber(&mut remaining);
        write_positions(&mut tx, "themed_collections", &remaining).await?;

        tx.commit().await?;
        info!(id = %id, "Collection deleted");
        Ok(())
    }

    /// Flips the active flag; returns the new value.
    pub async fn toggle_collection(&self, id: &str) -> DbResult<bool> {
        let mut collection = self
            .get_collection(id)
            .await?
            .ok_or_else(|| DbError::not_found("Collection", id))?;

        let active = collection.toggle_active();
        self.update_collection(&collection).await?;
        Ok(active)
    }

    /// Moves a collection to `new_position` (0-based) and renumbers the rest.
    pub async fn move_collection(
        &self,
        id: &str,
        new_position: usize,
    ) -> DbResult<Vec<ThemedCollection>> {
        let mut tx = self.pool.begin().await?;

        let mut collections = collections_in_order(&mut tx, false).await?;
        move_to(&mut collections, "Collection", id, new_position)?;
        write_positions(&mut tx, "themed_collections", &collections).await?;

        tx.commit().await?;
        debug!(id = %id, position = new_position, "Collection moved");
        Ok(collections)
    }

    /// Adds a product to the end of a collection. Returns `false` if it was
    /// already there.
    pub async fn add_product(&self, collection_id: &str, product_id: &str) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let mut collection = load_collection(&mut tx, collection_id)
            .await?
            .ok_or_else(|| DbError::not_found("Collection", collection_id))?;

        if !collection.add_product(product_id) {
            return Ok(false);
        }

        let position = collection.product_ids.len() as i64 - 1;
        insert_collection_product(&mut tx, collection_id, product_id, position).await?;
        touch_collection(&mut tx, collection_id).await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Removes a product from a collection. Returns `false` if it wasn't in it.
    pub async fn remove_product(&self, collection_id: &str, product_id: &str) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let mut collection = load_collection(&mut tx, collection_id)
            .await?
            .ok_or_else(|| DbError::not_found("Collection", collection_id))?;

        if !collection.remove_product(product_id) {
            return Ok(false);
        }

        sqlx::query("DELETE FROM collection_products WHERE collection_id = ?1")
            .bind(collection_id)
            .execute(&mut *tx)
            .await?;
        for (idx, id) in collection.product_ids.iter().enumerate() {
            insert_collection_product(&mut tx, collection_id, id, idx as i64).await?;
        }
        touch_collection(&mut tx, collection_id).await?;

        tx.commit().await?;
        Ok(true)
    }

    // =========================================================================
    // Carousel
    // =========================================================================

    /// Adds a carousel slide at the end.
    pub async fn create_carousel_item(&self, item: &CarouselItem) -> DbResult<CarouselItem> {
        item.validate()?;

        let mut tx = self.pool.begin().await?;

        let position: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(position) + 1, 0) FROM carousel_items")
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query(
            r#"
            INSERT INTO carousel_items (
                id, title, subtitle, image_url, link_target, position, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.title)
        .bind(&item.subtitle)
        .bind(&item.image_url)
        .bind(&item.link_target)
        .bind(position)
        .bind(item.is_active)
        .bind(item.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut created = item.clone();
        created.position = position;
        Ok(created)
    }

    pub async fn update_carousel_item(&self, item: &CarouselItem) -> DbResult<()> {
        item.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE carousel_items
            SET title = ?2, subtitle = ?3, image_url = ?4, link_target = ?5, is_active = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.title)
        .bind(&item.subtitle)
        .bind(&item.image_url)
        .bind(&item.link_target)
        .bind(item.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Carousel item", &item.id));
        }
        Ok(())
    }

    pub async fn list_carousel(&self, active_only: bool) -> DbResult<Vec<CarouselItem>> {
        let mut conn = self.pool.acquire().await?;
        carousel_in_order(&mut conn, active_only).await
    }

    pub async fn delete_carousel_item(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM carousel_items WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Carousel item", id));
        }

        let mut remaining = carousel_in_order(&mut tx, false).await?;
        lustre_core::storefront::renumber(&mut remaining);
        write_positions(&mut tx, "carousel_items", &remaining).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn toggle_carousel_item(&self, id: &str) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let mut item = carousel_in_order(&mut tx, false)
            .await?
            .into_iter()
            .find(|i| i.id == id)
            .ok_or_else(|| DbError::not_found("Carousel item", id))?;

        let active = item.toggle_active();
        sqlx::query("UPDATE carousel_items SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(active)
    }

    pub async fn move_carousel_item(
        &self,
        id: &str,
        new_position: usize,
    ) -> DbResult<Vec<CarouselItem>> {
        let mut tx = self.pool.begin().await?;

        let mut items = carousel_in_order(&mut tx, false).await?;
        move_to(&mut items, "Carousel item", id, new_position)?;
        write_positions(&mut tx, "carousel_items", &items).await?;

        tx.commit().await?;
        Ok(items)
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn collections_in_order(
    conn: &mut SqliteConnection,
    active_only: bool,
) -> DbResult<Vec<ThemedCollection>> {
    let sql = format!(
        r#"
        SELECT {COLLECTION_COLUMNS}
        FROM themed_collections
        WHERE (?1 = 0 OR is_active = 1)
        ORDER BY position, created_at
        "#
    );

    let collections = sqlx::query_as::<_, ThemedCollection>(&sql)
        .bind(active_only)
        .fetch_all(&mut *conn)
        .await?;

    Ok(collections)
}

async fn carousel_in_order(
    conn: &mut SqliteConnection,
    active_only: bool,
) -> DbResult<Vec<CarouselItem>> {
    let sql = format!(
        r#"
        SELECT {CAROUSEL_COLUMNS}
        FROM carousel_items
        WHERE (?1 = 0 OR is_active = 1)
        ORDER BY position, created_at
        "#
    );

    let items = sqlx::query_as::<_, CarouselItem>(&sql)
        .bind(active_only)
        .fetch_all(&mut *conn)
        .await?;

    Ok(items)
}

async fn load_collection(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<ThemedCollection>> {
    let sql = format!("SELECT {COLLECTION_COLUMNS} FROM themed_collections WHERE id = ?1");

    let collection = sqlx::query_as::<_, ThemedCollection>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match collection {
        Some(mut collection) => {
            collection.product_ids = product_ids(conn, id).await?;
            Ok(Some(collection))
        }
        None => Ok(None),
    }
}

async fn product_ids(conn: &mut SqliteConnection, collection_id: &str) -> DbResult<Vec<String>> {
    let ids = sqlx::query_scalar(
        "SELECT product_id FROM collection_products WHERE collection_id = ?1 ORDER BY position",
    )
    .bind(collection_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ids)
}

async fn insert_collection_product(
    conn: &mut SqliteConnection,
    collection_id: &str,
    product_id: &str,
    position: i64,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO collection_products (collection_id, product_id, position) VALUES (?1, ?2, ?3)",
    )
    .bind(collection_id)
    .bind(product_id)
    .bind(position)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn touch_collection(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    sqlx::query("UPDATE themed_collections SET updated_at = ?2 WHERE id = ?1")
        .bind(id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Writes back each item's position. `table` is one of the two storefront
/// tables, never user input.
async fn write_positions<T: Positioned>(
    conn: &mut SqliteConnection,
    table: &'static str,
    items: &[T],
) -> DbResult<()> {
    let sql = format!("UPDATE {table} SET position = ?2 WHERE id = ?1");

    for item in items {
        sqlx::query(&sql)
            .bind(item.id())
            .bind(item.position())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_ring, seed_gold, test_db};
    use lustre_core::CoreError;

    fn names(collections: &[ThemedCollection]) -> Vec<&str> {
        collections.iter().map(|c| c.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_collections_append_and_move() {
        let db = test_db().await;
        let repo = db.storefront();

        for name in ["Bridal", "Festive", "Everyday", "Temple"] {
            repo.create_collection(&ThemedCollection::new(name, None, None))
                .await
                .unwrap();
        }

        let listed = repo.list_collections(false).await.unwrap();
        assert_eq!(names(&listed), ["Bridal", "Festive", "Everyday", "Temple"]);
        assert_eq!(listed[3].position, 3);

        let temple = listed[3].id.clone();
        let moved = repo.move_collection(&temple, 1).await.unwrap();
        assert_eq!(names(&moved), ["Bridal", "Temple", "Festive", "Everyday"]);

        let reloaded = repo.list_collections(false).await.unwrap();
        assert_eq!(names(&reloaded), ["Bridal", "Temple", "Festive", "Everyday"]);
        let positions: Vec<i64> = reloaded.iter().map(|c| c.position).collect();
        assert_eq!(positions, [0, 1, 2, 3]);

        repo.delete_collection(&temple).await.unwrap();
        let after = repo.list_collections(false).await.unwrap();
        let positions: Vec<i64> = after.iter().map(|c| c.position).collect();
        assert_eq!(positions, [0, 1, 2]);

        assert!(matches!(
            repo.move_collection("missing", 0).await,
            Err(DbError::Domain(CoreError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_collection_products() {
        let db = test_db().await;
        seed_gold(&db).await;
        let a = insert_ring(&db, "RNG-001").await;
        let b = insert_ring(&db, "RNG-002").await;

        let bridal = db
            .storefront()
            .create_collection(&ThemedCollection::new("Bridal", None, None))
            .await
            .unwrap();

        assert!(db.storefront().add_product(&bridal.id, &a.id).await.unwrap());
        assert!(db.storefront().add_product(&bridal.id, &b.id).await.unwrap());
        assert!(!db.storefront().add_product(&bridal.id, &a.id).await.unwrap());

        let loaded = db.storefront().get_collection(&bridal.id).await.unwrap().unwrap();
        assert_eq!(loaded.product_ids, vec![a.id.clone(), b.id.clone()]);

        assert!(db.storefront().remove_product(&bridal.id, &a.id).await.unwrap());
        assert!(!db.storefront().remove_product(&bridal.id, &a.id).await.unwrap());

        let loaded = db.storefront().get_collection(&bridal.id).await.unwrap().unwrap();
        assert_eq!(loaded.product_ids, vec![b.id]);
    }

    #[tokio::test]
    async fn test_toggle_and_active_filter() {
        let db = test_db().await;
        let festive = db
            .storefront()
            .create_collection(&ThemedCollection::new("Festive", None, None))
            .await
            .unwrap();

        assert!(!db.storefront().toggle_collection(&festive.id).await.unwrap());
        assert!(db.storefront().list_collections(true).await.unwrap().is_empty());
        assert_eq!(db.storefront().list_collections(false).await.unwrap().len(), 1);

        let invalid = ThemedCollection::new("", None, None);
        assert!(matches!(
            db.storefront().create_collection(&invalid).await,
            Err(DbError::Domain(_))
        ));
    }

    #[tokio::test]
    async fn test_carousel() {
        let db = test_db().await;
        let repo = db.storefront();

        let mut first = CarouselItem::new("Diwali offers", "https://cdn.example.com/diwali.jpg");
        first.link_target = Some("collection:festive".to_string());
        let first = repo.create_carousel_item(&first).await.unwrap();
        let second = repo
            .create_carousel_item(&CarouselItem::new(
                "New arrivals",
                "https://cdn.example.com/new.jpg",
            ))
            .await
            .unwrap();
        assert_eq!(second.position, 1);

        let moved = repo.move_carousel_item(&second.id, 0).await.unwrap();
        assert_eq!(moved[0].id, second.id);

        assert!(!repo.toggle_carousel_item(&first.id).await.unwrap());
        let active = repo.list_carousel(true).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);

        repo.delete_carousel_item(&second.id).await.unwrap();
        let all = repo.list_carousel(false).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].position, 0);

        let bad = CarouselItem::new("Broken", "ftp://example.com/x.jpg");
        assert!(repo.create_carousel_item(&bad).await.is_err());
    }
}
