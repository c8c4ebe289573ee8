//! # Repository Module
//!
//! Database repository implementations for Shopbook.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and Owner Scope                         │
//! │                                                                         │
//! │  web-api service                                                       │
//! │       │                                                                 │
//! │       │  db.products().get_for_owner(id, owner_id)                     │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  └── WHERE id = ?1 AND owner_id = ?2                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Another store's row and a missing row look the same: None             │
//! │                                                                         │
//! │  Multi-statement mutations (sale, payment, account delete, overdue     │
//! │  sweep) run in one transaction and roll back on any error.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`AccountRepository`] - Accounts and the delete guard
//! - [`SessionRepository`] - Login sessions
//! - [`ProductRepository`] - Owner-scoped catalog
//! - [`SaleRepository`] - Atomic sale recording, listings
//! - [`CreditRepository`] - Payments, overdue sweep, payment history

pub mod account;
pub mod credit;
pub mod product;
pub mod sale;
pub mod session;

pub use account::AccountRepository;
pub use credit::CreditRepository;
pub use product::ProductRepository;
pub use sale::SaleRepository;
pub use session::SessionRepository;

#[cfg(test)]
pub(crate) mod fixtures;
