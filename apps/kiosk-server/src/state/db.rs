//! # Database State
//!
//! Wraps the `Database` handle for use in handlers.
//!
//! ## Usage in Handlers
//! ```rust,ignore
//! async fn menu(State(db): State<DbState>) -> Result<Json<Vec<Product>>, ApiError> {
//!     let products = db.inner().products().list_available().await?;
//!     Ok(Json(products))
//! }
//! ```

use kiosk_db::Database;

/// Wrapper around `Database` for axum state.
///
/// `Database` holds a `SqlitePool` and the change feed, both shared
/// handles, so cloning per request is cheap.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
