//! HTTP handlers, one module per area.
//!
//! Every handler that touches store data takes a [`crate::context::RequestContext`]
//! and runs its capability check before calling into the repositories.

pub mod account_service;
pub mod credit_service;
pub mod health_service;
pub mod product_service;
pub mod sale_service;
pub mod session_service;
