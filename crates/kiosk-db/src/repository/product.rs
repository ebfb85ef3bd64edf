//! # Product Repository
//!
//! Menu and inventory rows.
//!
//! ## Key Operations
//! - Menu listing in category order
//! - Stock set / delta, clamped at zero in SQL
//! - Availability toggle and price changes from the dashboard
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Staff taps "-5" on a product with 3 in stock                       │
//! │                                                                     │
//! │  UPDATE products SET stock = MAX(0, stock + ?delta)                 │
//! │                                                                     │
//! │  → stock = 0, never -2. The clamp runs inside the UPDATE so two     │
//! │    dashboards adjusting at once can't race past zero.               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::changes::{ChangeFeed, ChangeOp, ChangeTable, TableChange};
use crate::error::{DbError, DbResult};
use kiosk_core::inventory::{clamp_price, clamp_stock};
use kiosk_core::{validation, NewProduct, Product, DEFAULT_LOW_STOCK_THRESHOLD, MAX_STOCK};

pub(crate) const PRODUCT_COLUMNS: &str = "id, name_key, category, price_cents, image_url, is_available, \
     stock, low_stock_threshold, requires_milk, created_at, updated_at";

/// Menu order: category tabs left to right, then name key.
const MENU_ORDER: &str = "CASE category \
     WHEN 'matcha' THEN 0 WHEN 'protein' THEN 1 WHEN 'coffee' THEN 2 \
     WHEN 'snacks' THEN 3 WHEN 'sweets' THEN 4 ELSE 5 END, name_key";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    changes: ChangeFeed,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, changes: ChangeFeed) -> Self {
        ProductRepository { pool, changes }
    }

    /// Every product, in menu order.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {} FROM products ORDER BY {}", PRODUCT_COLUMNS, MENU_ORDER);
        let products = sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?;
        Ok(products)
    }

    /// Products shown on the kiosk, in menu order.
    pub async fn list_available(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE is_available = 1 ORDER BY {}",
            PRODUCT_COLUMNS, MENU_ORDER
        );
        let products = sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?;
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Products for a set of ids. Unknown ids are skipped.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_many(&mut conn, ids).await
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated fields
    /// * `Err(DbError::UniqueViolation)` - id already exists
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        if let Some(id) = &new.id {
            validation::validate_product_id(id)?;
        }
        validation::validate_name_key(&new.name_key)?;
        validation::validate_price_cents(new.price_cents)?;
        validation::validate_stock(new.stock)?;
        let threshold = new.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        validation::validate_low_stock_threshold(threshold)?;

        let now = Utc::now();
        let product = Product {
            id: new.id.clone().unwrap_or_else(generate_product_id),
            name_key: new.name_key.clone(),
            category: new.category,
            price_cents: new.price_cents,
            image_url: new.image_url.clone(),
            is_available: new.is_available.unwrap_or(true),
            stock: clamp_stock(new.stock),
            low_stock_threshold: threshold,
            requires_milk: new.requires_milk,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name_key = %product.name_key, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name_key, category, price_cents, image_url,
                is_available, stock, low_stock_threshold, requires_milk,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name_key)
        .bind(product.category)
        .bind(product.price_cents)
        .bind(&product.image_url)
        .bind(product.is_available)
        .bind(product.stock)
        .bind(product.low_stock_threshold)
        .bind(product.requires_milk)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.id),
            other => other,
        })?;

        self.publish(ChangeOp::Insert, &product.id);
        Ok(product)
    }

    /// Sets stock to an absolute value (negative input becomes 0).
    pub async fn set_stock(&self, id: &str, stock: i64) -> DbResult<Product> {
        validation::validate_stock(stock)?;
        let stock = clamp_stock(stock);
        debug!(id = %id, stock, "Setting stock");

        let sql = format!(
            "UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1 RETURNING {}",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(stock)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        self.publish(ChangeOp::Update, id);
        Ok(product)
    }

    /// Adds `delta` to stock, kept within `0..=MAX_STOCK`.
    ///
    /// The bounded delta keeps `stock + delta` inside SQLite's integer range.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        validation::validate_stock_delta(delta)?;
        debug!(id = %id, delta, "Adjusting stock");

        let sql = format!(
            "UPDATE products SET stock = MIN(?4, MAX(0, stock + ?2)), updated_at = ?3 WHERE id = ?1 RETURNING {}",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(delta)
            .bind(Utc::now())
            .bind(MAX_STOCK)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        self.publish(ChangeOp::Update, id);
        Ok(product)
    }

    /// Flips `is_available`.
    pub async fn toggle_availability(&self, id: &str) -> DbResult<Product> {
        debug!(id = %id, "Toggling availability");

        let sql = format!(
            "UPDATE products SET is_available = NOT is_available, updated_at = ?2 WHERE id = ?1 RETURNING {}",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        self.publish(ChangeOp::Update, id);
        Ok(product)
    }

    pub async fn set_availability(&self, id: &str, available: bool) -> DbResult<Product> {
        let sql = format!(
            "UPDATE products SET is_available = ?2, updated_at = ?3 WHERE id = ?1 RETURNING {}",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(available)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        self.publish(ChangeOp::Update, id);
        Ok(product)
    }

    /// Sets the base price (negative input becomes 0).
    pub async fn set_price(&self, id: &str, price_cents: i64) -> DbResult<Product> {
        let price_cents = clamp_price(price_cents);
        validation::validate_price_cents(price_cents)?;
        debug!(id = %id, price_cents, "Setting price");

        let sql = format!(
            "UPDATE products SET price_cents = ?2, updated_at = ?3 WHERE id = ?1 RETURNING {}",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(price_cents)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        self.publish(ChangeOp::Update, id);
        Ok(product)
    }

    /// Products whose stock is under their threshold, emptiest first.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE stock < low_stock_threshold ORDER BY stock, name_key",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?;
        Ok(products)
    }

    /// Counts total products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    fn publish(&self, op: ChangeOp, id: &str) {
        self.changes
            .publish(TableChange::new(ChangeTable::Products, op, Some(id.to_string())));
    }
}

/// Loads products by id on an existing connection (pool or transaction).
pub(crate) async fn fetch_many(conn: &mut SqliteConnection, ids: &[String]) -> DbResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
    query.push(PRODUCT_COLUMNS).push(" FROM products WHERE id IN (");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    let products = query.build_query_as::<Product>().fetch_all(&mut *conn).await?;
    Ok(products)
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
