//! # State Module
//!
//! Application state for the kiosk server.
//!
//! Instead of handlers taking one `AppState` and reaching into it, each
//! handler extracts only the substates it needs (`State<DbState>`,
//! `State<CartState>`, ...). `AppState` is the router state and hands the
//! substates out through `FromRef`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  Router::with_state(AppState)                                           │
//! │          │                                                              │
//! │          ├──► DbState            Database (pool + change feed)          │
//! │          ├──► CartState          Arc<Mutex<Cart>>                       │
//! │          ├──► ConfigState        Arc<ServerConfig> + BusinessDay        │
//! │          ├──► LiveState          RwLock snapshots of orders, products,  │
//! │          │                       settings                               │
//! │          ├──► AuthState          Arc<JwtManager>                        │
//! │          └──► IntegrationsState  Resend / PostHog clients (optional)    │
//! │                                                                         │
//! │  THREAD SAFETY:                                                         │
//! │  • DbState: SqlitePool is internally synchronized                       │
//! │  • CartState: std Mutex, never held across an await                     │
//! │  • LiveState: tokio RwLock, written only by reloads and optimistic      │
//! │    updates                                                              │
//! │  • Everything else is read-only after startup                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod auth;
mod cart;
mod config;
mod db;
mod integrations;
mod live;

pub use auth::AuthState;
pub use cart::CartState;
pub use config::ConfigState;
pub use db::DbState;
pub use integrations::IntegrationsState;
pub use live::LiveState;

use axum::extract::FromRef;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use kiosk_db::{Database, DbResult};

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: DbState,
    pub cart: CartState,
    pub config: ConfigState,
    pub live: LiveState,
    pub auth: AuthState,
    pub integrations: IntegrationsState,
}

impl AppState {
    /// Builds every substate and loads the live snapshots.
    pub async fn new(db: Database, config: ServerConfig) -> DbResult<Self> {
        let live = LiveState::load(&db).await?;
        let integrations = IntegrationsState::from_config(&config);

        Ok(AppState {
            db: DbState::new(db),
            cart: CartState::new(),
            auth: AuthState::new(&config.auth),
            config: ConfigState::new(config),
            live,
            integrations,
        })
    }

    /// Replaces the outbound clients (tests point them at local stand-ins).
    pub fn with_integrations(mut self, integrations: IntegrationsState) -> Self {
        self.integrations = integrations;
        self
    }

    /// Starts the live snapshot listener.
    pub fn spawn_background(&self) -> JoinHandle<()> {
        self.live.spawn_listener(self.db.inner().clone())
    }
}

impl FromRef<AppState> for DbState {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for CartState {
    fn from_ref(state: &AppState) -> Self {
        state.cart.clone()
    }
}

impl FromRef<AppState> for ConfigState {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for LiveState {
    fn from_ref(state: &AppState) -> Self {
        state.live.clone()
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for IntegrationsState {
    fn from_ref(state: &AppState) -> Self {
        state.integrations.clone()
    }
}
