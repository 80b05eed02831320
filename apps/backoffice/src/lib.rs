//! # Lustre Back Office Library
//!
//! Core library for the store's back office desktop app: the state the
//! commands share, the commands themselves, and the Tauri shell that exposes
//! them to the window.
//!
//! ## Module Organization
//! ```text
//! lustre_backoffice/
//! ├── lib.rs          ◄─── You are here (Tauri setup & run)
//! ├── ipc.rs          ◄─── #[tauri::command] handlers (desktop feature)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── cart.rs     ◄─── Counter cart
//! │   └── config.rs   ◄─── Store settings (file, database, env)
//! ├── commands/
//! │   ├── product.rs  ◄─── Catalog search and maintenance
//! │   ├── catalog.rs  ◄─── Materials, stones, metal rates
//! │   ├── customer.rs ◄─── Customer registry and wishlists
//! │   ├── cart.rs     ◄─── Cart manipulation
//! │   ├── checkout.rs ◄─── Invoices and payments
//! │   ├── booking.rs  ◄─── Appointment slots and bookings
//! │   ├── storefront.rs ◄─ Collections and carousel
//! │   └── config.rs   ◄─── Settings and amount formatting
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## State Management
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐   │
//! │  │    DbState       │ │    CartState     │ │    ConfigState       │   │
//! │  │                  │ │                  │ │                      │   │
//! │  │  • Database pool │ │  • Current cart  │ │  • Store identity    │   │
//! │  │  • Repositories  │ │  • Line prices   │ │  • GST policy        │   │
//! │  │                  │ │                  │ │  • Booking hours     │   │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────────┘   │
//! │                                                                         │
//! │  Each command takes only the state it needs.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
#[cfg(feature = "desktop")]
pub mod ipc;
pub mod state;

use std::path::PathBuf;

#[cfg(feature = "desktop")]
use directories::ProjectDirs;
use thiserror::Error;
use tracing::{info, warn};
#[cfg(feature = "desktop")]
use tracing_subscriber::EnvFilter;

use lustre_db::{Database, DbConfig, DbError};
use state::config::{self as app_config, ConfigError};
use state::{CartState, ConfigState, DbState};

/// Overrides where the database file lives.
pub const DB_PATH_ENV: &str = "LUSTRE_DB_PATH";

/// Failures that stop the back office from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database unavailable: {0}")]
    Db(#[from] DbError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not determine the app data directory")]
    NoDataDir,

    #[cfg(feature = "desktop")]
    #[error("desktop shell failed: {0}")]
    Tauri(#[from] tauri::Error),
}

/// Everything the commands run against.
#[derive(Debug, Clone)]
pub struct App {
    pub db: DbState,
    pub cart: CartState,
    pub config: ConfigState,
}

impl App {
    /// Wraps an open database and resolved settings, with an empty cart.
    pub fn new(db: Database, config: lustre_core::AppConfig) -> Self {
        App {
            db: DbState::new(db),
            cart: CartState::new(),
            config: ConfigState::new(config),
        }
    }

    /// In-memory store with gold 22K at ₹6,000/g and diamonds at ₹65,000/ct.
    #[cfg(test)]
    pub(crate) async fn test_app() -> Self {
        use chrono::{Duration, Utc};
        use lustre_core::{AppConfig, Material, Stone};

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();
        let now = Utc::now();

        catalog
            .insert_material(&Material {
                id: "gold".to_string(),
                name: "Gold".to_string(),
                is_active: true,
                created_at: now,
            })
            .await
            .unwrap();
        catalog
            .set_rate("gold", "22K", 600_000, now - Duration::days(1))
            .await
            .unwrap();
        catalog
            .upsert_stone(&Stone {
                id: "diamond".to_string(),
                name: "Diamond".to_string(),
                rate_paise_per_ct: 6_500_000,
                is_active: true,
                updated_at: now,
            })
            .await
            .unwrap();

        App::new(db, AppConfig::default())
    }
}

/// Opens the database and resolves settings.
///
/// Settings layer as defaults < `config_file` < saved in the database <
/// `LUSTRE_*` environment variables.
pub async fn open_store(
    db_config: DbConfig,
    config_file: Option<PathBuf>,
) -> Result<App, StartupError> {
    let db = Database::new(db_config).await?;
    info!("Database connected and migrations applied");

    let file = match config_file {
        Some(path) => app_config::load_file(&path)?,
        None => {
            warn!("No config directory on this platform, using defaults");
            lustre_core::AppConfig::default()
        }
    };
    let saved = db.config().load().await?;
    let config = app_config::resolve(file, saved, |key| std::env::var(key).ok())?;
    info!(
        store = %config.store_name,
        prefix = %config.invoice_prefix,
        gst = ?config.gst,
        "Settings loaded"
    );

    Ok(App::new(db, config))
}

/// Runs the Tauri application.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Logging       tracing to stderr, RUST_LOG overrides the default     │
/// │  2. Database      LUSTRE_DB_PATH or the platform data directory         │
/// │                   WAL mode, pending migrations applied                  │
/// │  3. Settings      defaults < lustre.toml < saved < LUSTRE_* env         │
/// │  4. State         DbState, CartState, ConfigState managed by Tauri      │
/// │  5. Window        commands registered, main window opened               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[cfg(feature = "desktop")]
pub fn run() -> Result<(), StartupError> {
    use tauri::Manager;

    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Lustre back office");

    tauri::Builder::default()
        .setup(|app| {
            let db_path = database_path()?;
            info!(path = %db_path.display(), "Database path determined");

            // Setup runs before the event loop, so blocking here is fine
            let store = tauri::async_runtime::block_on(open_store(
                DbConfig::new(db_path),
                app_config::config_file_path(),
            ))?;

            app.manage(store.db);
            app.manage(store.cart);
            app.manage(store.config);

            info!("State initialized");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Products
            ipc::search_products,
            ipc::get_product,
            ipc::get_product_by_sku,
            ipc::list_category,
            ipc::low_stock,
            ipc::create_product,
            ipc::update_product,
            ipc::adjust_stock,
            ipc::delete_product,
            // Catalog
            ipc::list_materials,
            ipc::create_material,
            ipc::list_stones,
            ipc::get_stone,
            ipc::upsert_stone,
            ipc::set_metal_rate,
            ipc::rate_board,
            ipc::rate_history,
            // Customers
            ipc::save_customer,
            ipc::find_customer,
            ipc::search_customers,
            ipc::toggle_wishlist,
            ipc::wishlist,
            // Cart
            ipc::get_cart,
            ipc::add_to_cart,
            ipc::update_cart_item,
            ipc::set_line_discount,
            ipc::remove_from_cart,
            ipc::clear_cart,
            ipc::set_cart_customer,
            ipc::refresh_cart_rates,
            // Checkout & invoices
            ipc::preview_invoice,
            ipc::checkout,
            ipc::add_payment,
            ipc::void_invoice,
            ipc::get_invoice,
            ipc::get_invoice_by_number,
            ipc::list_invoices,
            ipc::day_summary,
            ipc::invoice_text,
            ipc::record_invoice_pdf,
            // Appointments
            ipc::open_day,
            ipc::create_slot,
            ipc::list_slots,
            ipc::block_slot,
            ipc::delete_slot,
            ipc::book_appointment,
            ipc::get_booking,
            ipc::list_bookings,
            ipc::update_booking_status,
            // Storefront
            ipc::list_collections,
            ipc::get_collection,
            ipc::create_collection,
            ipc::update_collection,
            ipc::delete_collection,
            ipc::toggle_collection,
            ipc::move_collection,
            ipc::add_to_collection,
            ipc::remove_from_collection,
            ipc::list_carousel,
            ipc::create_carousel_item,
            ipc::update_carousel_item,
            ipc::delete_carousel_item,
            ipc::toggle_carousel_item,
            ipc::move_carousel_item,
            // Settings
            ipc::get_config,
            ipc::save_config,
            ipc::format_amount,
            ipc::parse_amount,
        ])
        .run(tauri::generate_context!())?;

    info!("Lustre back office stopped");
    Ok(())
}

/// Structured logging to stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=lustre=trace` - Trace for the lustre crates only
/// - Default: INFO, DEBUG for lustre, WARN for sqlx
#[cfg(feature = "desktop")]
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lustre=debug,sqlx=warn"));

    // try_init: a second call keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Where the database file lives.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.lustre.backoffice/lustre.db`
/// - **Windows**: `%APPDATA%\lustre\backoffice\data\lustre.db`
/// - **Linux**: `~/.local/share/backoffice/lustre.db`
///
/// Set `LUSTRE_DB_PATH` to use a custom path.
#[cfg(feature = "desktop")]
fn database_path() -> Result<PathBuf, StartupError> {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let dirs = ProjectDirs::from("com", "lustre", "backoffice").ok_or(StartupError::NoDataDir)?;
    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join("lustre.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_store_without_config_file() {
        let app = open_store(DbConfig::in_memory(), None).await.unwrap();

        assert!(app.db.inner().health_check().await);
        assert_eq!(app.config.current().invoice_prefix, "INV");
        assert!(app.cart.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_open_store_reads_config_file() {
        let path = std::env::temp_dir().join(format!("lustre-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "store_name = \"Kanak Jewellers\"\n").unwrap();

        let app = open_store(DbConfig::in_memory(), Some(path.clone())).await.unwrap();
        assert_eq!(app.config.current().store_name, "Kanak Jewellers");

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_open_store_rejects_bad_config_file() {
        let path = std::env::temp_dir().join(format!("lustre-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "invoice_prefix = [").unwrap();

        let err = open_store(DbConfig::in_memory(), Some(path.clone())).await.unwrap_err();
        assert!(matches!(err, StartupError::Config(_)));

        let _ = std::fs::remove_file(&path);
    }
}
