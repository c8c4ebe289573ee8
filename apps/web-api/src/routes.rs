//! Route table.
//!
//! ```text
//! POST   /api/session                   login
//! GET    /api/session                   current identity
//! DELETE /api/session                   logout
//!
//! GET    /api/accounts                  managed accounts
//! POST   /api/accounts                  create admin / employee
//! PUT    /api/accounts/{id}             edit
//! DELETE /api/accounts/{id}             delete (only when it owns nothing)
//! POST   /api/accounts/{id}/toggle-block
//!
//! GET    /api/products                  catalog
//! POST   /api/products                  create (admin)
//! PUT    /api/products/{id}             edit / restock (admin)
//!
//! GET    /api/sales                     sales list
//! POST   /api/sales                     record a sale
//! GET    /api/sales/export              CSV (admin)
//! GET    /api/sales/{id}/receipt        plain-text receipt
//!
//! GET    /api/credits                   credit ledger (admin)
//! GET    /api/credits/{id}/payments     payment history
//! POST   /api/credits/{id}/payments     register a payment
//!
//! GET    /health
//! ```

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower::ServiceBuilder;

use crate::services::{
    account_service, credit_service, health_service, product_service, sale_service,
    session_service,
};
use crate::AppState;

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Builds the application router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route(
            "/session",
            post(session_service::login)
                .get(session_service::current)
                .delete(session_service::logout),
        )
        .route(
            "/accounts",
            get(account_service::list).post(account_service::create),
        )
        .route(
            "/accounts/{id}",
            put(account_service::update).delete(account_service::delete),
        )
        .route("/accounts/{id}/toggle-block", post(account_service::toggle_block))
        .route(
            "/products",
            get(product_service::list).post(product_service::create),
        )
        .route("/products/{id}", put(product_service::update))
        .route("/sales", get(sale_service::list).post(sale_service::record))
        .route("/sales/export", get(sale_service::export))
        .route("/sales/{id}/receipt", get(sale_service::receipt))
        .route("/credits", get(credit_service::list))
        .route(
            "/credits/{id}/payments",
            get(credit_service::history).post(credit_service::pay),
        );

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_service::check))
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(MAX_BODY_BYTES)))
        .with_state(state)
}
