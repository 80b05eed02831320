//! # Storefront Commands
//!
//! Curating what the shop's storefront shows: themed collections of
//! products and the home page carousel. Both are ordered lists; moves
//! renumber positions contiguously from 0.

use serde::Deserialize;
use tracing::info;

use crate::commands::{Changed, IdArgs, Toggled};
use crate::error::{ApiError, ApiResult};
use crate::state::DbState;
use lustre_core::storefront::{CarouselItem, ThemedCollection};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListArgs {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionArgs {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub product_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCollectionArgs {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveArgs {
    pub id: String,
    /// Zero-based target position; past the end means last.
    pub position: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionProductArgs {
    pub collection_id: String,
    pub product_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselArgs {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_target: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCarouselArgs {
    pub id: String,
    #[serde(flatten)]
    pub item: CarouselArgs,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Collections
// =============================================================================

pub async fn list_collections(db: &DbState, args: ListArgs) -> ApiResult<Vec<ThemedCollection>> {
    Ok(db.inner().storefront().list_collections(args.active_only).await?)
}

pub async fn get_collection(db: &DbState, args: IdArgs) -> ApiResult<ThemedCollection> {
    db.inner()
        .storefront()
        .get_collection(&args.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Collection", &args.id))
}

/// Creates a collection at the end of the list.
pub async fn create_collection(db: &DbState, args: CollectionArgs) -> ApiResult<ThemedCollection> {
    let mut collection = ThemedCollection::new(
        &args.name,
        non_blank(args.description),
        non_blank(args.image_url),
    );
    for product_id in &args.product_ids {
        collection.add_product(product_id);
    }

    let created = db.inner().storefront().create_collection(&collection).await?;
    info!(
        id = %created.id,
        name = %created.name,
        position = created.position,
        "Collection created"
    );
    Ok(created)
}

pub async fn update_collection(
    db: &DbState,
    args: UpdateCollectionArgs,
) -> ApiResult<ThemedCollection> {
    let storefront = db.inner().storefront();
    let mut collection = get_collection(db, IdArgs { id: args.id.clone() }).await?;

    collection.name = args.name.trim().to_string();
    collection.description = non_blank(args.description);
    collection.image_url = non_blank(args.image_url);
    storefront.update_collection(&collection).await?;

    get_collection(db, IdArgs { id: args.id }).await
}

pub async fn delete_collection(db: &DbState, args: IdArgs) -> ApiResult<()> {
    db.inner().storefront().delete_collection(&args.id).await?;
    info!(id = %args.id, "Collection deleted");
    Ok(())
}

pub async fn toggle_collection(db: &DbState, args: IdArgs) -> ApiResult<Toggled> {
    let enabled = db.inner().storefront().toggle_collection(&args.id).await?;
    Ok(Toggled { enabled })
}

pub async fn move_collection(db: &DbState, args: MoveArgs) -> ApiResult<Vec<ThemedCollection>> {
    Ok(db
        .inner()
        .storefront()
        .move_collection(&args.id, args.position)
        .await?)
}

pub async fn add_to_collection(db: &DbState, args: CollectionProductArgs) -> ApiResult<Changed> {
    let changed = db
        .inner()
        .storefront()
        .add_product(&args.collection_id, &args.product_id)
        .await?;
    Ok(Changed { changed })
}

pub async fn remove_from_collection(
    db: &DbState,
    args: CollectionProductArgs,
) -> ApiResult<Changed> {
    let changed = db
        .inner()
        .storefront()
        .remove_product(&args.collection_id, &args.product_id)
        .await?;
    Ok(Changed { changed })
}

// =============================================================================
// Carousel
// =============================================================================

pub async fn list_carousel(db: &DbState, args: ListArgs) -> ApiResult<Vec<CarouselItem>> {
    Ok(db.inner().storefront().list_carousel(args.active_only).await?)
}

pub async fn create_carousel_item(db: &DbState, args: CarouselArgs) -> ApiResult<CarouselItem> {
    let mut item = CarouselItem::new(&args.title, &args.image_url);
    item.subtitle = non_blank(args.subtitle);
    item.link_target = non_blank(args.link_target);

    let created = db.inner().storefront().create_carousel_item(&item).await?;
    info!(id = %created.id, position = created.position, "Carousel item created");
    Ok(created)
}

pub async fn update_carousel_item(
    db: &DbState,
    args: UpdateCarouselArgs,
) -> ApiResult<CarouselItem> {
    let storefront = db.inner().storefront();
    let mut item = storefront
        .list_carousel(false)
        .await?
        .into_iter()
        .find(|i| i.id == args.id)
        .ok_or_else(|| ApiError::not_found("Carousel item", &args.id))?;

    item.title = args.item.title.trim().to_string();
    item.subtitle = non_blank(args.item.subtitle);
    item.image_url = args.item.image_url.trim().to_string();
    item.link_target = non_blank(args.item.link_target);
    storefront.update_carousel_item(&item).await?;
    Ok(item)
}

pub async fn delete_carousel_item(db: &DbState, args: IdArgs) -> ApiResult<()> {
    db.inner().storefront().delete_carousel_item(&args.id).await?;
    Ok(())
}

pub async fn toggle_carousel_item(db: &DbState, args: IdArgs) -> ApiResult<Toggled> {
    let enabled = db.inner().storefront().toggle_carousel_item(&args.id).await?;
    Ok(Toggled { enabled })
}

pub async fn move_carousel_item(db: &DbState, args: MoveArgs) -> ApiResult<Vec<CarouselItem>> {
    Ok(db
        .inner()
        .storefront()
        .move_carousel_item(&args.id, args.position)
        .await?)
}
