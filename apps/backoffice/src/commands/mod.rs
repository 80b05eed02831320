//! # Commands
//!
//! One function per operation the back office screens perform, grouped by
//! area. Each takes the state it needs plus a deserialized argument struct
//! and returns `Result<T, ApiError>` where `T` serializes to the response.
//!
//! | Module       | Operations                                           |
//! |--------------|------------------------------------------------------|
//! | `product`    | search, lookup, create/update, stock, low stock      |
//! | `catalog`    | materials, stones, metal rate board                  |
//! | `customer`   | customer registry, wishlist                          |
//! | `cart`       | add/update/remove lines, discounts, totals           |
//! | `checkout`   | preview, checkout, payments, void, invoice text      |
//! | `booking`    | appointment slots and bookings                       |
//! | `storefront` | themed collections and carousel                      |
//! | `config`     | store settings, amount formatting                    |

pub mod booking;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod customer;
pub mod product;
pub mod storefront;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Arguments for commands that address one record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdArgs {
    pub id: String,
}

/// Arguments for commands scoped to a business day. Missing means today.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateArgs {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl DateArgs {
    pub fn date_or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(today)
    }
}

/// Result of a toggle: the new state.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toggled {
    pub enabled: bool,
}

/// Result of a set membership change: whether anything changed.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Changed {
    pub changed: bool,
}

/// The store's business date. Invoice numbers and appointment days follow
/// the local calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::cart::{add_to_cart, get_cart};
    use super::checkout::checkout;
    use super::product::create_product;
    use crate::App;

    /// Arguments arrive as the webview's camelCase JSON.
    fn from_ui<T: serde::de::DeserializeOwned>(value: Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_sale_with_ui_json() {
        let app = App::test_app().await;

        let product = create_product(
            &app.db,
            from_ui(json!({
                "sku": "RNG-22K-001",
                "name": "Solitaire Ring",
                "category": "Ring",
                "materialId": "gold",
                "purity": "22K",
                "grossWeightMg": 10000,
                "makingRatePaisePerG": 50000,
                "currentStock": 1
            })),
        )
        .await
        .unwrap();

        let cart = add_to_cart(
            &app.db,
            &app.cart,
            &app.config,
            from_ui(json!({ "productId": product.id })),
        )
        .await
        .unwrap();
        let cart = serde_json::to_value(cart).unwrap();
        assert_eq!(cart["totals"]["grandTotal"], 6_695_000);

        let invoice = checkout(
            &app.db,
            &app.cart,
            &app.config,
            from_ui(json!({ "payments": [{ "method": "cash", "amount": 6_700_000 }] })),
        )
        .await
        .unwrap();
        let invoice = serde_json::to_value(invoice).unwrap();
        assert_eq!(invoice["status"], "paid");
        assert_eq!(invoice["settlement"]["change"], 5_000);

        let cart = get_cart(&app.cart, &app.config).unwrap();
        assert!(cart.items.is_empty());
    }

    #[test]
    fn test_missing_date_means_today() {
        let args: super::DateArgs = from_ui(json!({}));
        assert_eq!(args.date_or_today(), super::today());

        let args: super::DateArgs = from_ui(json!({ "date": "2026-10-19" }));
        assert_eq!(args.date_or_today().to_string(), "2026-10-19");
    }
}
