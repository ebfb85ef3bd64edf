//! # Reports
//!
//! Read-side views over orders and products: the admin order boards, the
//! dashboard numbers, order history, the end-of-day summary and the
//! kiosk funnel metrics.
//!
//! Everything here is a pure function of its inputs plus an explicit
//! `now`, so the same views can run over a live snapshot or a query result.
//!
//! ## Business Day
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "Today" is the café's calendar day, not UTC's.                         │
//! │                                                                         │
//! │   offset -05:00, now = 2026-10-16T03:30Z  (22:30 local on the 15th)     │
//! │                                                                         │
//! │   start_of_today     = 2026-10-15T05:00Z                                │
//! │   start_of_yesterday = 2026-10-14T05:00Z                                │
//! │   yesterday          = [start_of_yesterday, start_of_today)             │
//! │   week               = [now - 7 days, ∞)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{DashboardStats, Order, OrderStatus, Product};
use crate::{RECENT_ORDERS_LIMIT, TOP_PRODUCTS_LIMIT};

// =============================================================================
// Business Day
// =============================================================================

/// Calendar-day boundaries in the café's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessDay {
    offset: FixedOffset,
}

impl Default for BusinessDay {
    fn default() -> Self {
        BusinessDay::utc()
    }
}

impl BusinessDay {
    pub fn utc() -> Self {
        BusinessDay {
            offset: Utc.fix(),
        }
    }

    /// Builds a business day from a UTC offset in minutes (-300 for UTC-5).
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, ValidationError> {
        FixedOffset::east_opt(minutes * 60)
            .map(|offset| BusinessDay { offset })
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "utc_offset_minutes".to_string(),
                min: -1439,
                max: 1439,
            })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local calendar date at `now`.
    pub fn date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// Local midnight of `date`, as a UTC instant.
    pub fn start_of(&self, date: NaiveDate) -> DateTime<Utc> {
        let local_midnight = date.and_time(NaiveTime::MIN);
        let utc_naive = local_midnight - Duration::seconds(self.offset.local_minus_utc() as i64);
        Utc.from_utc_datetime(&utc_naive)
    }

    pub fn start_of_today(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of(self.date(now))
    }

    pub fn start_of_yesterday(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of_today(now) - Duration::days(1)
    }
}

// =============================================================================
// Order Boards
// =============================================================================

/// Status filter on the admin orders board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// Every order still on the counter (non-terminal).
    #[default]
    All,
    Only(OrderStatus),
}

impl FromStr for StatusFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(StatusFilter::All),
            other => other.parse().map(StatusFilter::Only),
        }
    }
}

pub fn orders_by_status(orders: &[Order], filter: StatusFilter) -> Vec<&Order> {
    orders
        .iter()
        .filter(|o| match filter {
            StatusFilter::All => o.status.is_active(),
            StatusFilter::Only(status) => o.status == status,
        })
        .collect()
}

/// Orders created since the start of the business day.
pub fn today_orders<'a>(orders: &'a [Order], day: &BusinessDay, now: DateTime<Utc>) -> Vec<&'a Order> {
    let start = day.start_of_today(now);
    orders.iter().filter(|o| o.created_at >= start).collect()
}

/// Orders that have left the board: completed or cancelled.
pub fn completed_orders(orders: &[Order]) -> Vec<&Order> {
    orders.iter().filter(|o| o.status.is_terminal()).collect()
}

/// First `limit` active orders, in the order given (newest first from the store).
pub fn recent_active_orders(orders: &[Order], limit: usize) -> Vec<&Order> {
    orders.iter().filter(|o| o.status.is_active()).take(limit).collect()
}

/// Headline numbers for the admin overview.
pub fn dashboard_stats(
    orders: &[Order],
    products: &[Product],
    day: &BusinessDay,
    now: DateTime<Utc>,
) -> DashboardStats {
    let today = today_orders(orders, day, now);
    let revenue: Money = today
        .iter()
        .filter(|o| o.status != OrderStatus::Cancelled)
        .map(|o| o.total())
        .sum();

    DashboardStats {
        orders_today: today.len(),
        pending_orders: orders.iter().filter(|o| o.status == OrderStatus::Pending).count(),
        revenue_today_cents: revenue.cents(),
        low_stock_products: products.iter().filter(|p| p.is_low_stock()).count(),
    }
}

/// Dashboard payload: stats plus the most recent active orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardView {
    pub stats: DashboardStats,
    pub recent_orders: Vec<Order>,
}

impl DashboardView {
    pub fn build(orders: &[Order], products: &[Product], day: &BusinessDay, now: DateTime<Utc>) -> Self {
        DashboardView {
            stats: dashboard_stats(orders, products, day, now),
            recent_orders: recent_active_orders(orders, RECENT_ORDERS_LIMIT)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}

// =============================================================================
// History
// =============================================================================

/// Date window on the history page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRange {
    Today,
    Yesterday,
    Week,
    #[default]
    All,
}

impl FromStr for HistoryRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(HistoryRange::Today),
            "yesterday" => Ok(HistoryRange::Yesterday),
            "week" => Ok(HistoryRange::Week),
            "" | "all" => Ok(HistoryRange::All),
            _ => Err(ValidationError::NotAllowed {
                field: "range".to_string(),
                allowed: ["today", "yesterday", "week", "all"].map(String::from).to_vec(),
            }),
        }
    }
}

impl HistoryRange {
    fn contains(&self, created_at: DateTime<Utc>, day: &BusinessDay, now: DateTime<Utc>) -> bool {
        match self {
            HistoryRange::Today => created_at >= day.start_of_today(now),
            HistoryRange::Yesterday => {
                created_at >= day.start_of_yesterday(now) && created_at < day.start_of_today(now)
            }
            HistoryRange::Week => created_at >= now - Duration::days(7),
            HistoryRange::All => true,
        }
    }
}

/// Completed and cancelled orders in `range` whose number contains `search`.
pub fn order_history<'a>(
    orders: &'a [Order],
    range: HistoryRange,
    search: &str,
    day: &BusinessDay,
    now: DateTime<Utc>,
) -> Vec<&'a Order> {
    let needle = search.trim().to_lowercase();
    completed_orders(orders)
        .into_iter()
        .filter(|o| range.contains(o.created_at, day, now))
        .filter(|o| needle.is_empty() || o.order_number.to_lowercase().contains(&needle))
        .collect()
}

// =============================================================================
// Daily Summary
// =============================================================================

/// A best-seller line in the daily summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TopProduct {
    pub name: String,
    pub quantity: i64,
}

/// End-of-day numbers for the owner email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_orders: usize,
    pub total_revenue_cents: i64,
    pub top_products: Vec<TopProduct>,
}

impl DailySummary {
    /// Builds the summary from the day's orders. Cancelled orders don't count.
    ///
    /// Best-sellers are grouped by the product name snapshot, ranked by
    /// units sold, ties broken by name.
    pub fn from_orders<'a, I>(orders: I, date: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Order>,
    {
        let mut total_orders = 0;
        let mut revenue = Money::zero();
        let mut units: HashMap<&str, i64> = HashMap::new();

        for order in orders.into_iter().filter(|o| o.status != OrderStatus::Cancelled) {
            total_orders += 1;
            revenue += order.total();
            for item in &order.items {
                *units.entry(item.product_name.as_str()).or_insert(0) += item.quantity;
            }
        }

        let mut top_products: Vec<TopProduct> = units
            .into_iter()
            .map(|(name, quantity)| TopProduct {
                name: name.to_string(),
                quantity,
            })
            .collect();
        top_products.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
        top_products.truncate(TOP_PRODUCTS_LIMIT);

        DailySummary {
            date,
            total_orders,
            total_revenue_cents: revenue.cents(),
            top_products,
        }
    }

    pub fn total_revenue(&self) -> Money {
        Money::from_cents(self.total_revenue_cents)
    }
}

// =============================================================================
// Funnel Metrics
// =============================================================================

/// Kiosk analytics events counted by the metrics proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunnelEvent {
    Pageview,
    LanguageSelected,
    ProductAdded,
    CheckoutStarted,
    CartAbandoned,
}

impl FunnelEvent {
    pub const ALL: [FunnelEvent; 5] = [
        FunnelEvent::Pageview,
        FunnelEvent::LanguageSelected,
        FunnelEvent::ProductAdded,
        FunnelEvent::CheckoutStarted,
        FunnelEvent::CartAbandoned,
    ];

    /// Event name as the kiosk frontend captures it.
    pub fn event_name(&self) -> &'static str {
        match self {
            FunnelEvent::Pageview => "$pageview",
            FunnelEvent::LanguageSelected => "language_selected",
            FunnelEvent::ProductAdded => "product_added_to_cart",
            FunnelEvent::CheckoutStarted => "checkout_started",
            FunnelEvent::CartAbandoned => "cart_abandoned",
        }
    }
}

impl fmt::Display for FunnelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Raw event counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunnelCounts {
    pub pageviews: u64,
    pub language_selected: u64,
    pub product_added: u64,
    pub checkout_started: u64,
    pub cart_abandoned: u64,
}

impl FunnelCounts {
    pub fn set(&mut self, event: FunnelEvent, count: u64) {
        match event {
            FunnelEvent::Pageview => self.pageviews = count,
            FunnelEvent::LanguageSelected => self.language_selected = count,
            FunnelEvent::ProductAdded => self.product_added = count,
            FunnelEvent::CheckoutStarted => self.checkout_started = count,
            FunnelEvent::CartAbandoned => self.cart_abandoned = count,
        }
    }
}

/// Counts plus derived rates, as the metrics page expects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FunnelMetrics {
    pub pageviews: u64,
    pub language_selected: u64,
    pub product_added: u64,
    pub checkout_started: u64,
    pub cart_abandoned: u64,
    /// Percent with one decimal ("42.9"), or "0" with no pageviews.
    pub activation_rate: String,
    /// Percent with one decimal, or "0" when nobody picked a language.
    pub conversion_rate: String,
}

impl FunnelMetrics {
    pub fn from_counts(counts: FunnelCounts) -> Self {
        FunnelMetrics {
            pageviews: counts.pageviews,
            language_selected: counts.language_selected,
            product_added: counts.product_added,
            checkout_started: counts.checkout_started,
            cart_abandoned: counts.cart_abandoned,
            activation_rate: percent(counts.language_selected, counts.pageviews),
            conversion_rate: percent(counts.checkout_started, counts.language_selected),
        }
    }
}

fn percent(numerator: u64, denominator: u64) -> String {
    if denominator == 0 {
        return "0".to_string();
    }
    format!("{:.1}", numerator as f64 / denominator as f64 * 100.0)
}

// =============================================================================
// Unit Tests
// =============================================================================
