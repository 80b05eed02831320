//! # Customer Commands
//!
//! Customer registry keyed by phone number, and per-customer wishlists.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::DbState;
use lustre_core::{Customer, Product};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerArgs {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneArgs {
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSearchArgs {
    pub query: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistArgs {
    pub customer_id: String,
    pub product_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerIdArgs {
    pub customer_id: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistToggled {
    pub in_wishlist: bool,
}

/// Registers a customer, or updates the name and email of the one already
/// registered with this phone number.
pub async fn save_customer(db: &DbState, args: CustomerArgs) -> ApiResult<Customer> {
    if let Some(email) = args.email.as_deref().filter(|e| !e.trim().is_empty()) {
        lustre_core::validation::validate_email(email.trim())?;
    }

    let customer = db
        .inner()
        .customers()
        .upsert(&args.name, &args.phone, args.email.as_deref())
        .await?;
    info!(id = %customer.id, "Customer saved");
    Ok(customer)
}

pub async fn find_customer(db: &DbState, args: PhoneArgs) -> ApiResult<Customer> {
    db.inner()
        .customers()
        .get_by_phone(&args.phone)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", &args.phone))
}

pub async fn search_customers(db: &DbState, args: CustomerSearchArgs) -> ApiResult<Vec<Customer>> {
    let limit = args.limit.unwrap_or(20).clamp(1, 100);
    debug!(query = %args.query, limit, "search_customers command");
    Ok(db.inner().customers().search(&args.query, limit).await?)
}

pub async fn toggle_wishlist(db: &DbState, args: WishlistArgs) -> ApiResult<WishlistToggled> {
    let in_wishlist = db
        .inner()
        .customers()
        .toggle_wishlist(&args.customer_id, &args.product_id)
        .await?;
    debug!(
        customer = %args.customer_id,
        product = %args.product_id,
        in_wishlist,
        "Wishlist toggled"
    );
    Ok(WishlistToggled { in_wishlist })
}

pub async fn wishlist(db: &DbState, args: CustomerIdArgs) -> ApiResult<Vec<Product>> {
    Ok(db.inner().customers().wishlist(&args.customer_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::product::{create_product, tests::ring_input};
    use crate::error::ErrorCode;
    use crate::App;

    #[tokio::test]
    async fn test_save_and_find_by_any_phone_format() {
        let app = App::test_app().await;

        let saved = save_customer(
            &app.db,
            CustomerArgs {
                name: "Meera Iyer".to_string(),
                phone: "+91 98765 43210".to_string(),
                email: None,
            },
        )
        .await
        .unwrap();

        let found = find_customer(
            &app.db,
            PhoneArgs {
                phone: "9876543210".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(found.id, saved.id);

        let err = save_customer(
            &app.db,
            CustomerArgs {
                name: "Meera Iyer".to_string(),
                phone: "9876543210".to_string(),
                email: Some("not-an-email".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_wishlist_toggle() {
        let app = App::test_app().await;
        let product = create_product(&app.db, ring_input("RNG-22K-001")).await.unwrap();
        let customer = save_customer(
            &app.db,
            CustomerArgs {
                name: "Meera Iyer".to_string(),
                phone: "9876543210".to_string(),
                email: None,
            },
        )
        .await
        .unwrap();

        let args = WishlistArgs {
            customer_id: customer.id.clone(),
            product_id: product.id.clone(),
        };
        assert!(toggle_wishlist(&app.db, args.clone()).await.unwrap().in_wishlist);

        let list = wishlist(
            &app.db,
            CustomerIdArgs {
                customer_id: customer.id.clone(),
            },
        )
        .await
        .unwrap();
        assert_eq!(list.len(), 1);

        assert!(!toggle_wishlist(&app.db, args).await.unwrap().in_wishlist);
    }
}
