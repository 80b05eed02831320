//! # Database State
//!
//! Shared handle to the SQLite pool and its repositories.

use lustre_db::Database;

/// Wrapper around `Database` for the command layer.
///
/// `Database` is a cheap clone of the pool; commands borrow it through
/// [`DbState::inner`].
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let products = db_state.inner().products().search("kada", 20).await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
