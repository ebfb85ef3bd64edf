//! # Order Workflow
//!
//! The counter state machine every order walks through.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   pending ──► preparing ──► ready ──► completed                         │
//! │      │            │           │                                         │
//! │      └────────────┴───────────┴──────► cancelled                        │
//! │                                                                         │
//! │   - forward one step at a time                                          │
//! │   - cancel from any non-terminal state                                  │
//! │   - completed / cancelled are terminal                                  │
//! │   - nothing moves on its own (no timeouts)                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::{Order, OrderStatus, StatusChange};

impl OrderStatus {
    /// The next state along the forward chain, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Still on the counter board.
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether `to` is a legal move from this state.
    ///
    /// ```rust
    /// use kiosk_core::OrderStatus;
    ///
    /// assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Preparing));
    /// assert!(OrderStatus::Ready.can_transition_to(OrderStatus::Cancelled));
    /// assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Ready));
    /// assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
    /// ```
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        if self.next() == Some(to) {
            return true;
        }
        to == OrderStatus::Cancelled && self.is_active()
    }
}

/// Checks a transition without touching the order.
pub fn check_transition(order: &Order, to: OrderStatus) -> CoreResult<()> {
    if order.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            order_number: order.order_number.clone(),
            from: order.status,
            to,
        })
    }
}

/// Moves an order to `to`, stamping timestamps and appending history.
///
/// Used for the persisted write and for the optimistic in-memory update,
/// so both agree on what a transition does to an order.
pub fn apply_transition(
    order: &mut Order,
    to: OrderStatus,
    at: DateTime<Utc>,
    note: Option<String>,
) -> CoreResult<()> {
    check_transition(order, to)?;

    order.status = to;
    order.updated_at = at;
    match to {
        OrderStatus::Completed => order.completed_at = Some(at),
        OrderStatus::Cancelled => order.cancelled_at = Some(at),
        _ => {}
    }
    order.status_history.push(StatusChange {
        status: to,
        timestamp: at,
        note,
    });

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
