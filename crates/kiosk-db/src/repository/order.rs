//! # Order Repository
//!
//! Order creation and the status workflow.
//!
//! ## Order Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 create_order_with_items (ONE transaction)               │
//! │                                                                         │
//! │  1. bump order_sequence            → "M042"                             │
//! │  2. load settings + products                                            │
//! │  3. kiosk_core::pricing::price_order                                    │
//! │        └── any rule fails → rollback, sequence bump is undone           │
//! │  4. INSERT orders                                                       │
//! │  5. INSERT order_items (name + price snapshots)                         │
//! │  6. INSERT order_status_history (pending)                               │
//! │  7. COMMIT → publish(orders/insert)                                     │
//! │                                                                         │
//! │  Either the order and all its items exist, or nothing does.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sequence bump comes first so the transaction takes SQLite's write
//! lock before it reads anything.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::changes::{ChangeFeed, ChangeOp, ChangeTable, TableChange};
use crate::error::{DbError, DbResult};
use crate::repository::product::fetch_many;
use crate::repository::settings::fetch_settings;
use kiosk_core::pricing::price_order;
use kiosk_core::workflow::apply_transition;
use kiosk_core::{
    format_order_number, NewOrder, Order, OrderExtras, OrderItem, OrderReceipt, OrderStatus, StatusChange,
};

const ORDER_COLUMNS: &str = "id, order_number, kiosk_token, extra_collagen, extra_ashwagandha, extra_honey, \
     subtotal_cents, extras_total_cents, total_cents, status, created_at, updated_at, completed_at, cancelled_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, milk, size, \
     unit_price_cents, subtotal_cents";

// =============================================================================
// Row Types
// =============================================================================

/// `orders` row without its children.
#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    kiosk_token: String,
    extra_collagen: bool,
    extra_ashwagandha: bool,
    extra_honey: bool,
    subtotal_cents: i64,
    extras_total_cents: i64,
    total_cents: i64,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>, status_history: Vec<StatusChange>) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            kiosk_token: self.kiosk_token,
            items,
            extras: OrderExtras {
                collagen: self.extra_collagen,
                ashwagandha: self.extra_ashwagandha,
                honey: self.extra_honey,
            },
            subtotal_cents: self.subtotal_cents,
            extras_total_cents: self.extras_total_cents,
            total_cents: self.total_cents,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            cancelled_at: self.cancelled_at,
            status_history,
        }
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    order_id: String,
    status: OrderStatus,
    timestamp: DateTime<Utc>,
    note: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for orders, their items and status history.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    changes: ChangeFeed,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool, changes: ChangeFeed) -> Self {
        OrderRepository { pool, changes }
    }

    /// Prices and stores an order submission atomically.
    ///
    /// Prices come from the current product rows and settings, never from
    /// the caller. Stock is not touched.
    ///
    /// ## Errors
    /// - `DbError::Domain` for empty orders, unknown or unavailable
    ///   products, milk rule violations, bad quantities
    pub async fn create_order_with_items(&self, new_order: &NewOrder) -> DbResult<OrderReceipt> {
        let mut tx = self.pool.begin().await?;

        let sequence: i64 = sqlx::query_scalar(
            "UPDATE order_sequence SET last_value = last_value + 1 WHERE id = 1 RETURNING last_value",
        )
        .fetch_one(&mut *tx)
        .await?;

        let settings = fetch_settings(&mut tx).await?;
        let ids: Vec<String> = new_order.items.iter().map(|i| i.product_id.clone()).collect();
        let products = fetch_many(&mut tx, &ids).await?;
        let by_id: HashMap<&str, &kiosk_core::Product> =
            products.iter().map(|p| (p.id.as_str(), p)).collect();

        let priced = price_order(new_order, |id| by_id.get(id).copied(), &settings)?;

        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();
        let order_number = format_order_number(sequence);
        let kiosk_token = Uuid::new_v4().to_string();

        debug!(
            order_id = %order_id,
            order_number = %order_number,
            lines = priced.lines.len(),
            total_cents = priced.totals.total_cents,
            "Creating order"
        );

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, kiosk_token,
                extra_collagen, extra_ashwagandha, extra_honey,
                subtotal_cents, extras_total_cents, total_cents,
                status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            "#,
        )
        .bind(&order_id)
        .bind(&order_number)
        .bind(&kiosk_token)
        .bind(priced.extras.collagen)
        .bind(priced.extras.ashwagandha)
        .bind(priced.extras.honey)
        .bind(priced.totals.subtotal_cents)
        .bind(priced.totals.extras_total_cents)
        .bind(priced.totals.total_cents)
        .bind(OrderStatus::Pending)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (position, line) in priced.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, position, product_id, product_name,
                    quantity, milk, size, unit_price_cents, subtotal_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order_id)
            .bind(position as i64)
            .bind(&line.product_id)
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.milk)
            .bind(line.size)
            .bind(line.unit_price_cents)
            .bind(line.subtotal_cents)
            .execute(&mut *tx)
            .await?;
        }

        insert_history(&mut tx, &order_id, OrderStatus::Pending, now, None).await?;

        tx.commit().await?;

        info!(order_number = %order_number, total_cents = priced.totals.total_cents, "Order created");
        self.publish(ChangeOp::Insert, &order_id);

        Ok(OrderReceipt {
            order_id,
            order_number,
            kiosk_token,
            subtotal_cents: priced.totals.subtotal_cents,
            extras_total_cents: priced.totals.extras_total_cents,
            total_cents: priced.totals.total_cents,
            status: OrderStatus::Pending,
            created_at: now,
        })
    }

    /// Gets an order with its items and history.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        load_order(&mut conn, id).await
    }

    /// Every order, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        let sql = format!("SELECT {} FROM orders ORDER BY created_at DESC, order_number DESC", ORDER_COLUMNS);
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, OrderRow>(&sql).fetch_all(&mut *conn).await?;
        hydrate(&mut conn, rows).await
    }

    /// Orders created at or after `since`, newest first.
    pub async fn list_created_since(&self, since: DateTime<Utc>) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {} FROM orders WHERE created_at >= ?1 ORDER BY created_at DESC, order_number DESC",
            ORDER_COLUMNS
        );
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(since)
            .fetch_all(&mut *conn)
            .await?;
        hydrate(&mut conn, rows).await
    }

    /// Moves an order to `to` through the workflow rules.
    ///
    /// ## Errors
    /// - `DbError::NotFound` for an unknown id
    /// - `DbError::Domain(InvalidTransition)` for a move the workflow forbids
    pub async fn update_status(&self, id: &str, to: OrderStatus, note: Option<String>) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;

        let mut order = load_order(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))?;
        let from = order.status;
        let now = Utc::now();

        apply_transition(&mut order, to, now, note.clone())?;

        sqlx::query(
            r#"
            UPDATE orders SET
                status = ?2,
                updated_at = ?3,
                completed_at = ?4,
                cancelled_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&order.id)
        .bind(order.status)
        .bind(order.updated_at)
        .bind(order.completed_at)
        .bind(order.cancelled_at)
        .execute(&mut *tx)
        .await?;

        insert_history(&mut tx, &order.id, to, now, note).await?;

        tx.commit().await?;

        info!(
            order_number = %order.order_number,
            from = %from,
            to = %to,
            "Order status changed"
        );
        self.publish(ChangeOp::Update, &order.id);

        Ok(order)
    }

    /// Cancels a non-terminal order.
    pub async fn cancel(&self, id: &str, note: Option<String>) -> DbResult<Order> {
        self.update_status(id, OrderStatus::Cancelled, note).await
    }

    /// Order lookup for the kiosk: the token must match.
    ///
    /// A wrong token looks exactly like a missing order.
    pub async fn find_for_kiosk(&self, id: &str, kiosk_token: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {} FROM orders WHERE id = ?1 AND kiosk_token = ?2", ORDER_COLUMNS);
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(kiosk_token)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => Ok(hydrate(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    fn publish(&self, op: ChangeOp, id: &str) {
        self.changes
            .publish(TableChange::new(ChangeTable::Orders, op, Some(id.to_string())));
    }
}

// =============================================================================
// Connection-level Helpers
// =============================================================================

async fn load_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS);
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(hydrate(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Attaches items and history to order rows, keeping the row order.
async fn hydrate(conn: &mut SqliteConnection, rows: Vec<OrderRow>) -> DbResult<Vec<Order>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();

    let mut items_query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
    items_query.push(ITEM_COLUMNS).push(" FROM order_items WHERE order_id IN (");
    let mut separated = items_query.separated(", ");
    for id in &ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY order_id, position");
    let items = items_query.build_query_as::<OrderItem>().fetch_all(&mut *conn).await?;

    let mut history_query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT order_id, status, timestamp, note FROM order_status_history WHERE order_id IN (");
    let mut separated = history_query.separated(", ");
    for id in &ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY id");
    let history = history_query.build_query_as::<HistoryRow>().fetch_all(&mut *conn).await?;

    let mut items_by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
    for item in items {
        items_by_order.entry(item.order_id.clone()).or_default().push(item);
    }

    let mut history_by_order: HashMap<String, Vec<StatusChange>> = HashMap::new();
    for row in history {
        history_by_order.entry(row.order_id).or_default().push(StatusChange {
            status: row.status,
            timestamp: row.timestamp,
            note: row.note,
        });
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let items = items_by_order.remove(&row.id).unwrap_or_default();
            let history = history_by_order.remove(&row.id).unwrap_or_default();
            row.into_order(items, history)
        })
        .collect())
}

async fn insert_history(
    conn: &mut SqliteConnection,
    order_id: &str,
    status: OrderStatus,
    at: DateTime<Utc>,
    note: Option<String>,
) -> DbResult<()> {
    sqlx::query("INSERT INTO order_status_history (order_id, status, timestamp, note) VALUES (?1, ?2, ?3, ?4)")
        .bind(order_id)
        .bind(status)
        .bind(at)
        .bind(note)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
