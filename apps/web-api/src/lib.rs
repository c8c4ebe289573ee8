//! # Shopbook API
//!
//! HTTP server for store administration, sales and installment credits.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            API Services                                 │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │ session        │  │ accounts       │  │ products                   ││
//! │  │                │  │                │  │                            ││
//! │  │ • login        │  │ • list/create  │  │ • list                     ││
//! │  │ • current      │  │ • update       │  │ • create                   ││
//! │  │ • logout       │  │ • block/delete │  │ • update                   ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────┐            │
//! │  │ sales          │  │ credits        │  │ health         │            │
//! │  │                │  │                │  │                │            │
//! │  │ • record/list  │  │ • ledger       │  │ • check        │            │
//! │  │ • receipt      │  │ • payments     │  │                │            │
//! │  │ • export (CSV) │  │                │  │                │            │
//! │  └────────────────┘  └────────────────┘  └────────────────┘            │
//! │                                                                         │
//! │  RequestContext (bearer token → session row → account) guards every   │
//! │  /api route except login.                                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  shopbook-db (SQLite)           shopbook-core (rules)            │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::AppConfig`]; every key can be set with a `SHOPBOOK__` env var.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod context;
pub mod error;
pub mod routes;
pub mod services;

use shopbook_db::Database;

use crate::auth::JwtManager;

// Re-exports
pub use self::config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use routes::build_router;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        let jwt = JwtManager::new(&config.jwt_secret, config.session_lifetime_secs);
        AppState { db, jwt, config }
    }
}
