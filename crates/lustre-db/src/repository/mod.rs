//! # Repository Module
//!
//! Database repository implementations for Lustre.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Command                                                               │
//! │       │                                                                 │
//! │       │  db.bookings().create_booking(&request)                        │
//! │       ▼                                                                 │
//! │  BookingRepository                                                     │
//! │  ├── create_slot(&self, slot)                                          │
//! │  ├── list_slots(&self, date)                                           │
//! │  ├── create_booking(&self, request)   ← one transaction                │
//! │  └── update_status(&self, id, status) ← releases capacity on cancel    │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business rules live in lustre-core; repositories load the entity, let the
//! core type decide, then persist the outcome.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD, search and stock
//! - [`catalog::CatalogRepository`] - Materials, stones and metal rates
//! - [`customer::CustomerRepository`] - Customers and wishlists
//! - [`booking::BookingRepository`] - Slots and bookings
//! - [`invoice::InvoiceRepository`] - Invoices, items and payments
//! - [`storefront::StorefrontRepository`] - Collections and carousel
//! - [`config::ConfigRepository`] - Persisted store configuration

pub mod booking;
pub mod catalog;
pub mod config;
pub mod customer;
pub mod invoice;
pub mod product;
pub mod storefront;

/// Generates a new entity ID.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Shared fixtures for repository tests.
#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use lustre_core::{Material, Product};

    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Inserts the "gold" material every test product references.
    pub async fn seed_gold(db: &Database) -> Material {
        let gold = Material {
            id: "gold".to_string(),
            name: "Gold".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        db.catalog().insert_material(&gold).await.unwrap();
        gold
    }

    /// 10 g 22K gold ring, making ₹500/g, 3 in stock.
    pub fn ring(sku: &str) -> Product {
        let now = Utc::now();
        Product {
            id: super::generate_id(),
            sku: sku.to_string(),
            name: format!("Ring {}", sku),
            description: None,
            category: "Ring".to_string(),
            material_id: "gold".to_string(),
            purity: "22K".to_string(),
            gross_weight_mg: 10_000,
            less_weight_mg: 0,
            making_rate_paise_per_g: 50_000,
            stone_id: None,
            cw_weight_cents: 0,
            va_charges_paise: 0,
            discount_bps: 0,
            current_stock: 3,
            image_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
            materials: Vec::new(),
        }
    }

    pub async fn insert_ring(db: &Database, sku: &str) -> Product {
        db.products().insert(&ring(sku)).await.unwrap()
    }
}
