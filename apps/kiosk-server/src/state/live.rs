//! # Live Collections
//!
//! In-memory snapshots of the orders, products and settings tables, kept
//! current by a background task listening to the database change feed.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Live Snapshot Refresh                                │
//! │                                                                         │
//! │  Repository write ──► ChangeFeed::publish(TableChange)                  │
//! │                              │                                          │
//! │                              ▼                                          │
//! │  listener task ──► recv() ──┬── Ok(change)  ──► reload(change.table)    │
//! │                             ├── Lagged(n)   ──► reload_all()            │
//! │                             └── Closed      ──► exit                    │
//! │                                                                         │
//! │  Admin reads ──► RwLock::read() on the snapshot (no DB round trip)      │
//! │  Status update ─► apply_optimistic() ─► DB write ─► reload(Orders)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each change reloads the whole affected collection. The tables are small
//! (a café's menu and a few days of orders), and a full reload can never
//! drift from the database the way incremental patches can.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use kiosk_core::{AppSettings, Order, Product};
use kiosk_db::{ChangeTable, Database, DbResult};

#[derive(Debug, Default)]
struct Snapshots {
    orders: RwLock<Vec<Order>>,
    products: RwLock<Vec<Product>>,
    settings: RwLock<AppSettings>,
}

#[derive(Debug, Clone, Default)]
pub struct LiveState {
    inner: Arc<Snapshots>,
}

impl LiveState {
    /// Builds the snapshots from the current database contents.
    pub async fn load(db: &Database) -> DbResult<Self> {
        let live = LiveState::default();
        live.reload_all(db).await?;
        Ok(live)
    }

    /// Replaces one snapshot with a fresh read of its table.
    pub async fn reload(&self, db: &Database, table: ChangeTable) -> DbResult<()> {
        match table {
            ChangeTable::Orders => {
                let orders = db.orders().list_all().await?;
                debug!(count = orders.len(), "Reloaded orders snapshot");
                *self.inner.orders.write().await = orders;
            }
            ChangeTable::Products => {
                let products = db.products().list_all().await?;
                debug!(count = products.len(), "Reloaded products snapshot");
                *self.inner.products.write().await = products;
            }
            ChangeTable::Settings => {
                let settings = db.settings().get().await?;
                debug!("Reloaded settings snapshot");
                *self.inner.settings.write().await = settings;
            }
        }
        Ok(())
    }

    pub async fn reload_all(&self, db: &Database) -> DbResult<()> {
        for table in [ChangeTable::Orders, ChangeTable::Products, ChangeTable::Settings] {
            self.reload(db, table).await?;
        }
        Ok(())
    }

    /// Replaces the snapshot copy of `order` ahead of the database write.
    ///
    /// Unknown orders are ignored; the next reload brings them in.
    pub async fn apply_optimistic(&self, order: &Order) {
        let mut orders = self.inner.orders.write().await;
        if let Some(slot) = orders.iter_mut().find(|o| o.id == order.id) {
            *slot = order.clone();
        }
    }

    pub async fn with_orders<R>(&self, f: impl FnOnce(&[Order]) -> R) -> R {
        let orders = self.inner.orders.read().await;
        f(&orders)
    }

    pub async fn with_products<R>(&self, f: impl FnOnce(&[Product]) -> R) -> R {
        let products = self.inner.products.read().await;
        f(&products)
    }

    pub async fn find_order(&self, id: &str) -> Option<Order> {
        self.with_orders(|orders| orders.iter().find(|o| o.id == id).cloned()).await
    }

    pub async fn settings(&self) -> AppSettings {
        self.inner.settings.read().await.clone()
    }

    /// Starts the background task that keeps the snapshots current.
    ///
    /// The subscription is taken before this returns, so no change
    /// published afterwards is missed.
    pub fn spawn_listener(&self, db: Database) -> JoinHandle<()> {
        let mut rx = db.changes().subscribe();
        let live = self.clone();

        tokio::spawn(async move {
            info!("Live snapshot listener started");
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        debug!(table = ?change.table, op = ?change.op, id = ?change.id, "Change received");
                        if let Err(e) = live.reload(&db, change.table).await {
                            warn!(table = ?change.table, error = %e, "Snapshot reload failed");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Listener lagged, reloading every snapshot");
                        if let Err(e) = live.reload_all(&db).await {
                            warn!(error = %e, "Full snapshot reload failed");
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            info!("Live snapshot listener stopped");
        })
    }
}
