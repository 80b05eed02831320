//! # Storefront
//!
//! Themed collections and the home-page carousel, both shown in `position`
//! order.
//!
//! ## Reordering
//! ```text
//!   before:  [A:0] [B:1] [C:2] [D:3]
//!   move_to(items, "D", 1)
//!   after:   [A:0] [D:1] [B:2] [C:3]     positions renumbered densely from 0
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation;

/// Maximum length of a collection name or carousel title.
pub const MAX_TITLE_LEN: usize = 80;

// =============================================================================
// Ordering
// =============================================================================

/// Something kept in a user-controlled display order.
pub trait Positioned {
    fn id(&self) -> &str;
    fn position(&self) -> i64;
    fn set_position(&mut self, position: i64);
}

/// Sorts by current position and rewrites positions as 0, 1, 2, ...
pub fn renumber<T: Positioned>(items: &mut [T]) {
    items.sort_by_key(|i| i.position());
    for (idx, item) in items.iter_mut().enumerate() {
        item.set_position(idx as i64);
    }
}

/// Moves one item to `new_position` and renumbers the rest.
///
/// A position past the end moves the item last.
pub fn move_to<T: Positioned>(
    items: &mut Vec<T>,
    entity: &'static str,
    id: &str,
    new_position: usize,
) -> CoreResult<()> {
    renumber(items);

    let from = items
        .iter()
        .position(|i| i.id() == id)
        .ok_or_else(|| CoreError::NotFound {
            entity,
            id: id.to_string(),
        })?;

    let item = items.remove(from);
    let to = new_position.min(items.len());
    items.insert(to, item);

    for (idx, item) in items.iter_mut().enumerate() {
        item.set_position(idx as i64);
    }
    Ok(())
}

// =============================================================================
// Themed Collection
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ThemedCollection {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub position: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Products in display order.
    #[serde(default)]
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub product_ids: Vec<String>,
}

impl ThemedCollection {
    pub fn new(name: &str, description: Option<String>, image_url: Option<String>) -> Self {
        let now = Utc::now();
        ThemedCollection {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description,
            image_url,
            position: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
            product_ids: Vec::new(),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        validation::validate_name("collection name", &self.name, MAX_TITLE_LEN)?;
        if let Some(url) = &self.image_url {
            validation::validate_url("image url", url)?;
        }
        Ok(())
    }

    /// Adds a product. Returns `false` if it was already in the collection.
    pub fn add_product(&mut self, product_id: &str) -> bool {
        if self.product_ids.iter().any(|p| p == product_id) {
            return false;
        }
        self.product_ids.push(product_id.to_string());
        self.updated_at = Utc::now();
        true
    }

    /// Removes a product. Returns `false` if it was not in the collection.
    pub fn remove_product(&mut self, product_id: &str) -> bool {
        let before = self.product_ids.len();
        self.product_ids.retain(|p| p != product_id);
        let removed = self.product_ids.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Flips `is_active` and returns the new value.
    pub fn toggle_active(&mut self) -> bool {
        self.is_active = !self.is_active;
        self.updated_at = Utc::now();
        self.is_active
    }
}

impl Positioned for ThemedCollection {
    fn id(&self) -> &str {
        &self.id
    }
    fn position(&self) -> i64 {
        self.position
    }
    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

// =============================================================================
// Carousel
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CarouselItem {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    /// `product:<id>`, `collection:<id>` or an http(s) URL.
    pub link_target: Option<String>,
    pub position: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CarouselItem {
    pub fn new(title: &str, image_url: &str) -> Self {
        CarouselItem {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            subtitle: None,
            image_url: image_url.trim().to_string(),
            link_target: None,
            position: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        validation::validate_name("title", &self.title, MAX_TITLE_LEN)?;
        validation::validate_url("image url", &self.image_url)?;
        if let Some(target) = &self.link_target {
            validate_link_target(target)?;
        }
        Ok(())
    }

    pub fn toggle_active(&mut self) -> bool {
        self.is_active = !self.is_active;
        self.is_active
    }
}

impl Positioned for CarouselItem {
    fn id(&self) -> &str {
        &self.id
    }
    fn position(&self) -> i64 {
        self.position
    }
    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

fn validate_link_target(target: &str) -> CoreResult<()> {
    if target.starts_with("http://") || target.starts_with("https://") {
        validation::validate_url("link target", target)?;
        return Ok(());
    }

    let id = target
        .strip_prefix("product:")
        .or_else(|| target.strip_prefix("collection:"));
    match id {
        Some(id) if !id.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "link target".to_string(),
            reason: "expected product:<id>, collection:<id> or a URL".to_string(),
        }
        .into()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn slides(names: &[&str]) -> Vec<CarouselItem> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let mut item = CarouselItem::new(n, "https://cdn.example.com/s.jpg");
                item.id = n.to_string();
                item.position = i as i64 * 10;
                item
            })
            .collect()
    }

    fn order(items: &[CarouselItem]) -> Vec<(&str, i64)> {
        items.iter().map(|i| (i.id.as_str(), i.position)).collect()
    }

    #[test]
    fn test_move_later_item_forward() {
        let mut items = slides(&["A", "B", "C", "D"]);
        move_to(&mut items, "carousel item", "D", 1).unwrap();
        assert_eq!(order(&items), vec![("A", 0), ("D", 1), ("B", 2), ("C", 3)]);
    }

    #[test]
    fn test_move_to_end_and_past_end() {
        let mut items = slides(&["A", "B", "C"]);
        move_to(&mut items, "carousel item", "A", 99).unwrap();
        assert_eq!(order(&items), vec![("B", 0), ("C", 1), ("A", 2)]);
    }

    #[test]
    fn test_move_unknown_id() {
        let mut items = slides(&["A"]);
        assert!(matches!(
            move_to(&mut items, "carousel item", "Z", 0),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_renumber_sorts_sparse_positions() {
        let mut items = slides(&["A", "B", "C"]);
        items[0].position = 50;
        renumber(&mut items);
        assert_eq!(order(&items), vec![("B", 0), ("C", 1), ("A", 2)]);
    }

    #[test]
    fn test_collection_products_without_duplicates() {
        let mut collection = ThemedCollection::new("Bridal", None, None);

        assert!(collection.add_product("p1"));
        assert!(collection.add_product("p2"));
        assert!(!collection.add_product("p1"));
        assert_eq!(collection.product_ids, vec!["p1", "p2"]);

        assert!(collection.remove_product("p1"));
        assert!(!collection.remove_product("p1"));
        assert_eq!(collection.product_ids, vec!["p2"]);
    }

    #[test]
    fn test_toggle_active() {
        let mut collection = ThemedCollection::new("Festive", None, None);
        assert!(!collection.toggle_active());
        assert!(collection.toggle_active());
    }

    #[test]
    fn test_validation() {
        assert!(ThemedCollection::new("", None, None).validate().is_err());
        assert!(ThemedCollection::new("Temple", None, Some("not a url".into()))
            .validate()
            .is_err());

        let mut slide = CarouselItem::new("Diwali", "https://cdn.example.com/d.jpg");
        assert!(slide.validate().is_ok());

        slide.link_target = Some("collection:abc".to_string());
        assert!(slide.validate().is_ok());

        slide.link_target = Some("product:".to_string());
        assert!(slide.validate().is_err());

        slide.link_target = Some("somewhere".to_string());
        assert!(slide.validate().is_err());
    }
}
