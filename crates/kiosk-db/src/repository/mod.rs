//! # Repository Module
//!
//! Database repository implementations for the kiosk.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.orders().update_status(id, Ready, None)                    │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── load order (items + history)                                      │
//! │  ├── kiosk_core::workflow::apply_transition                            │
//! │  ├── UPDATE orders / INSERT history   (one transaction)                │
//! │  └── ChangeFeed::publish                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Menu and inventory
//! - [`OrderRepository`](order::OrderRepository) - Order creation and workflow
//! - [`SettingsRepository`](settings::SettingsRepository) - Global prices and flags
//! - [`AdminRepository`](admin::AdminRepository) - Staff accounts

pub mod admin;
pub mod order;
pub mod product;
pub mod settings;
