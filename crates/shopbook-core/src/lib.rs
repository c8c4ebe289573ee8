//! # shopbook-core: Pure Business Logic for Shopbook
//!
//! This crate is the **heart** of Shopbook. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopbook Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Dashboard (browser)                          │   │
//! │  │    Super-admin ──► Admin dashboard ──► Employee sales screen    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    web-api (axum)                               │   │
//! │  │    login, accounts, products, sales, credits, export            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopbook-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  access  │ │  sales   │ │  credit  │ │  report  │          │   │
//! │  │   │  roles   │ │  totals  │ │ schedule │ │ receipt  │          │   │
//! │  │   │  expiry  │ │  stock   │ │ payments │ │   csv    │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  shopbook-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Account, Product, Sale, Credit, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`access`] - Authentication outcome, expiry and capability checks
//! - [`catalog`] - Product creation and edits in the owner's category
//! - [`sales`] - Sale pricing and stock rules
//! - [`credit`] - Installment credit schedule and payment transitions
//! - [`validation`] - Input validation
//! - [`report`] - Receipt and CSV rendering
//!
//! ## Example Usage
//!
//! ```rust
//! use shopbook_core::credit::clamp_installments;
//! use shopbook_core::money::Money;
//!
//! let total = Money::from_cents(60_000); // $600.00
//! let installments = clamp_installments(4);
//! assert_eq!(total.split_evenly(installments).cents(), 15_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod catalog;
pub mod credit;
pub mod error;
pub mod money;
pub mod report;
pub mod sales;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{AccessError, CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Lifetime of admin and employee accounts, counted from creation.
///
/// ## Business Reason
/// Store accounts are sold as 30-day subscriptions. An account older than
/// this is blocked on its next login attempt.
pub const ACCOUNT_LIFETIME_DAYS: i64 = 30;

/// Days between a credit payment (or credit opening) and the next due date.
pub const PAYMENT_INTERVAL_DAYS: i64 = 30;

/// Fewest installments a credit can be split into.
pub const MIN_INSTALLMENTS: i64 = 2;

/// Most installments a credit can be split into.
pub const MAX_INSTALLMENTS: i64 = 6;

/// Installments used when a credit sale does not ask for a number.
pub const DEFAULT_INSTALLMENTS: i64 = 6;

/// Maximum quantity of a single product in one sale.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_SALE_QUANTITY: i64 = 999;

/// Highest unit price a product may carry ($1,000,000,000.00).
///
/// Keeps `price * MAX_SALE_QUANTITY` inside the cents range.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;
