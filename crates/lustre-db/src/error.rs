//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error                      CoreError (pricing, booking rules)   │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  DbError ◄── constraint messages turned into store terms               │
//! │       │      ("products.sku" → "SKU", "customers.phone" → "phone")     │
//! │       ▼                                                                 │
//! │  ApiError (back office) ◄── returned to the webview by Tauri IPC       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use lustre_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write: a second product with the same
    /// SKU, a phone already registered, two invoices racing for one number.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A reference to a material, stone, slot or product that is not there.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A conditional update matched no row: stock ran out, a slot filled up,
    /// or a CHECK constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(#[from] CoreError),

    /// A JSON column (settings, GST policy, line snapshots) would not encode
    /// or decode.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Names a unique index the way the counter staff would.
///
/// SQLite reports `UNIQUE constraint failed: products.sku` (or several
/// comma separated columns for composite keys).
fn unique_field(columns: &str) -> String {
    match columns.trim() {
        "products.sku" => "SKU".to_string(),
        "customers.phone" => "phone".to_string(),
        "invoices.invoice_number" => "invoice number".to_string(),
        "invoices.business_date, invoices.sequence" => "invoice sequence".to_string(),
        "materials.name" => "material name".to_string(),
        "stones.name" => "stone name".to_string(),
        other => other
            .split(',')
            .map(|c| c.trim().rsplit('.').next().unwrap_or(c).replace('_', " "))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// ```text
/// RowNotFound                     → NotFound
/// UNIQUE constraint failed: t.c   → UniqueViolation { field: store name }
/// FOREIGN KEY constraint failed   → ForeignKeyViolation
/// CHECK constraint failed         → Conflict
/// PoolTimedOut                    → PoolExhausted
/// anything else                   → Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if let Some(columns) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::duplicate(unique_field(columns), "unknown")
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::Conflict(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
