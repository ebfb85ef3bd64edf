//! # Change Feed
//!
//! Every successful write publishes a [`TableChange`]. Listeners (the
//! server's live collections, the admin SSE stream) reload what changed.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  OrderRepository::update_status ──► commit ──► publish(orders/update)   │
//! │                                                    │                    │
//! │                              broadcast::Sender ────┤                    │
//! │                                                    ├──► LiveState       │
//! │                                                    └──► SSE /changes    │
//! │                                                                         │
//! │  Events carry no row data: subscribers re-read the whole table.         │
//! │  A lagged subscriber has missed events and should reload everything.    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of the broadcast buffer before slow subscribers lag.
pub const CHANGE_FEED_CAPACITY: usize = 256;

/// Tables that publish changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    Products,
    Orders,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Insert,
    Update,
}

/// One write notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableChange {
    pub table: ChangeTable,
    pub op: ChangeOp,
    /// Id of the affected row, when there is a single one.
    pub id: Option<String>,
}

impl TableChange {
    pub fn new(table: ChangeTable, op: ChangeOp, id: Option<String>) -> Self {
        TableChange { table, op, id }
    }
}

/// Broadcast channel of table changes. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<TableChange>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        ChangeFeed::new(CHANGE_FEED_CAPACITY)
    }
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        ChangeFeed { sender }
    }

    /// Publishes a change. Having no subscribers is not an error.
    pub fn publish(&self, change: TableChange) {
        trace!(table = ?change.table, op = ?change.op, "Publishing change");
        let _ = self.sender.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TableChange> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let feed = ChangeFeed::default();
        let mut rx = feed.subscribe();

        feed.publish(TableChange::new(ChangeTable::Orders, ChangeOp::Insert, Some("o-1".to_string())));

        let change = rx.recv().await.unwrap();
        assert_eq!(change.table, ChangeTable::Orders);
        assert_eq!(change.id.as_deref(), Some("o-1"));
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let feed = ChangeFeed::new(4);
        feed.publish(TableChange::new(ChangeTable::Settings, ChangeOp::Update, None));
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn test_wire_format() {
        let change = TableChange::new(ChangeTable::Products, ChangeOp::Update, Some("7".to_string()));
        let json = serde_json::to_string(&change).unwrap();
        assert_eq!(json, r#"{"table":"products","op":"update","id":"7"}"#);
    }
}
