//! # Error Types
//!
//! Domain-specific error types for shopbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopbook-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── AccessError      - Authentication / authorization failures        │
//! │                                                                         │
//! │  shopbook-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  web-api errors (in app)                                               │
//! │  └── ApiError         - What the client sees (status + JSON body)      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be resolved under the caller's owner scope.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist
    /// - Product belongs to another admin (deliberately indistinguishable)
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Insufficient stock to complete sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Record sale (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Sofa", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Credit cannot be resolved under the caller's owner scope.
    #[error("Credit not found: {0}")]
    CreditNotFound(String),

    /// Credit is already paid off.
    #[error("Credit {0} is already completed")]
    CreditCompleted(String),

    /// Payment would take the balance below zero.
    #[error("Payment of {requested} exceeds remaining balance {remaining}")]
    Overpayment { remaining: Money, requested: Money },

    /// Account cannot be deleted while it still owns data.
    #[error("Account {id} still owns {what}")]
    AccountInUse { id: String, what: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid phone, invalid id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Access Error
// =============================================================================

/// Authentication and authorization failures.
///
/// `InvalidCredentials` is used for both an unknown handle and a wrong
/// password so callers cannot probe which handles exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("invalid handle or password")]
    InvalidCredentials,

    #[error("account is blocked, contact your administrator")]
    AccountBlocked,

    #[error("authentication required")]
    Unauthenticated,

    #[error("access denied")]
    Forbidden,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
