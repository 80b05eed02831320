//! # Catalog Commands
//!
//! Materials, stones and the daily metal rate board.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::commands::IdArgs;
use crate::error::{ApiError, ApiResult};
use crate::state::DbState;
use lustre_core::validation;
use lustre_core::{Material, MetalRate, MetalRates, Stone, MAX_RATE_PAISE};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialArgs {
    /// Short stable key such as "gold".
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoneArgs {
    pub id: String,
    pub name: String,
    pub rate_paise_per_ct: i64,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRateArgs {
    pub material_id: String,
    pub purity: String,
    pub rate_paise_per_g: i64,
    /// Defaults to now.
    pub effective_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateHistoryArgs {
    pub material_id: String,
    pub purity: String,
    pub limit: Option<u32>,
}

// =============================================================================
// Materials & Stones
// =============================================================================

pub async fn list_materials(db: &DbState) -> ApiResult<Vec<Material>> {
    Ok(db.inner().catalog().list_materials().await?)
}

pub async fn create_material(db: &DbState, args: MaterialArgs) -> ApiResult<Material> {
    let id = args.id.trim().to_ascii_lowercase();
    validation::validate_sku(&id)?;
    validation::validate_name("material name", &args.name, 60)?;

    let material = Material {
        id,
        name: args.name.trim().to_string(),
        is_active: true,
        created_at: Utc::now(),
    };
    db.inner().catalog().insert_material(&material).await?;
    info!(id = %material.id, "Material created");
    Ok(material)
}

pub async fn list_stones(db: &DbState) -> ApiResult<Vec<Stone>> {
    Ok(db.inner().catalog().list_stones().await?)
}

/// Creates a stone or reprices an existing one.
pub async fn upsert_stone(db: &DbState, args: StoneArgs) -> ApiResult<Stone> {
    let id = args.id.trim().to_ascii_lowercase();
    validation::validate_sku(&id)?;
    validation::validate_name("stone name", &args.name, 60)?;
    validation::validate_at_most("stone rate", args.rate_paise_per_ct, MAX_RATE_PAISE)?;

    let stone = Stone {
        id,
        name: args.name.trim().to_string(),
        rate_paise_per_ct: args.rate_paise_per_ct,
        is_active: args.is_active,
        updated_at: Utc::now(),
    };
    db.inner().catalog().upsert_stone(&stone).await?;
    info!(id = %stone.id, rate = stone.rate_paise_per_ct, "Stone saved");
    Ok(stone)
}

pub async fn get_stone(db: &DbState, args: IdArgs) -> ApiResult<Stone> {
    db.inner()
        .catalog()
        .get_stone(&args.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Stone", &args.id))
}

// =============================================================================
// Metal Rates
// =============================================================================

/// Publishes a rate. Carts priced earlier keep their snapshot until
/// `refresh_cart_rates`.
pub async fn set_metal_rate(db: &DbState, args: SetRateArgs) -> ApiResult<MetalRate> {
    let effective_at = args.effective_at.unwrap_or_else(Utc::now);
    let rate = db
        .inner()
        .catalog()
        .set_rate(&args.material_id, &args.purity, args.rate_paise_per_g, effective_at)
        .await?;
    info!(
        material = %rate.material_id,
        purity = %rate.purity,
        rate = rate.rate_paise_per_g,
        "Metal rate published"
    );
    Ok(rate)
}

/// Latest rate for every material and purity.
pub async fn rate_board(db: &DbState) -> ApiResult<MetalRates> {
    debug!("rate_board command");
    Ok(db.inner().catalog().current_rates().await?)
}

pub async fn rate_history(db: &DbState, args: RateHistoryArgs) -> ApiResult<Vec<MetalRate>> {
    let limit = args.limit.unwrap_or(30).clamp(1, 365);
    Ok(db
        .inner()
        .catalog()
        .rate_history(&args.material_id, &args.purity, limit)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::App;

    #[tokio::test]
    async fn test_rate_board_shows_latest() {
        let app = App::test_app().await;

        set_metal_rate(
            &app.db,
            SetRateArgs {
                material_id: "gold".to_string(),
                purity: "22k".to_string(),
                rate_paise_per_g: 610_000,
                effective_at: None,
            },
        )
        .await
        .unwrap();

        let board = rate_board(&app.db).await.unwrap();
        let rate = board.rate_for("gold", "22K").unwrap();
        assert_eq!(rate.rate_paise_per_g, 610_000);

        let history = rate_history(
            &app.db,
            RateHistoryArgs {
                material_id: "gold".to_string(),
                purity: "22K".to_string(),
                limit: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_bad_catalog_input() {
        let app = App::test_app().await;

        let err = set_metal_rate(
            &app.db,
            SetRateArgs {
                material_id: "gold".to_string(),
                purity: "22K".to_string(),
                rate_paise_per_g: -1,
                effective_at: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = upsert_stone(
            &app.db,
            StoneArgs {
                id: "ruby".to_string(),
                name: String::new(),
                rate_paise_per_ct: 100,
                is_active: true,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = set_metal_rate(
            &app.db,
            SetRateArgs {
                material_id: "gold".to_string(),
                purity: "22K".to_string(),
                rate_paise_per_g: MAX_RATE_PAISE + 1,
                effective_at: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_stone_reprice() {
        let app = App::test_app().await;

        upsert_stone(
            &app.db,
            StoneArgs {
                id: "Diamond".to_string(),
                name: "Diamond".to_string(),
                rate_paise_per_ct: 7_000_000,
                is_active: true,
            },
        )
        .await
        .unwrap();

        let stone = get_stone(&app.db, IdArgs { id: "diamond".to_string() }).await.unwrap();
        assert_eq!(stone.rate_paise_per_ct, 7_000_000);
        assert_eq!(list_stones(&app.db).await.unwrap().len(), 1);
    }
}
