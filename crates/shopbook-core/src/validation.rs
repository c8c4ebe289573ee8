//! # Validation Module
//!
//! Input validation for Shopbook requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard (TypeScript)                                       │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: web-api service (Rust)                                       │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: field rules                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE handle                                                     │
//! │  ├── CHECK (stock >= 0)                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopbook_core::validation::{validate_handle, validate_quantity};
//!
//! validate_handle("maria.lopez").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_PRICE_CENTS, MAX_SALE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const MAX_HANDLE_LEN: usize = 80;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DEPARTMENT_LEN: usize = 50;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_ADDRESS_LEN: usize = 200;
pub const MAX_NOTES_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a login handle.
///
/// ## Rules
/// - Must not be empty, at most 80 characters
/// - Letters, digits, `.`, `_`, `-` only (no spaces)
///
/// ## Example
/// ```rust
/// use shopbook_core::validation::validate_handle;
///
/// assert!(validate_handle("store-admin_2").is_ok());
/// assert!(validate_handle("two words").is_err());
/// ```
pub fn validate_handle(handle: &str) -> ValidationResult<()> {
    required_text("handle", handle, MAX_HANDLE_LEN)?;

    if !handle
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "handle".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a new password. Not trimmed: whitespace is significant.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = password.chars().count();

    if len < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    if len > MAX_PASSWORD_LEN {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: MAX_PASSWORD_LEN,
        });
    }

    Ok(())
}

pub fn validate_display_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, MAX_NAME_LEN)
}

/// Validates a product name.
///
/// ## Example
/// ```rust
/// use shopbook_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Oak dining table").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, MAX_NAME_LEN)
}

pub fn validate_department(department: &str) -> ValidationResult<()> {
    required_text("department", department, MAX_DEPARTMENT_LEN)
}

/// Validates the customer fields captured on a sale.
///
/// ## Rules
/// - Name required, at most 100 characters
/// - Phone required, at most 20 characters of digits, spaces, `+`, `-`, `(`, `)`
pub fn validate_customer(name: &str, phone: &str) -> ValidationResult<()> {
    required_text("customer_name", name, MAX_NAME_LEN)?;
    required_text("customer_phone", phone, MAX_PHONE_LEN)?;

    if !phone
        .trim()
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "customer_phone".to_string(),
            reason: "must contain only digits, spaces, +, -, and parentheses".to_string(),
        });
    }

    Ok(())
}

/// Validates the customer address of a credit sale. May be left blank.
pub fn validate_address(address: &str) -> ValidationResult<()> {
    if address.trim().chars().count() > MAX_ADDRESS_LEN {
        return Err(ValidationError::TooLong {
            field: "customer_address".to_string(),
            max: MAX_ADDRESS_LEN,
        });
    }

    Ok(())
}

/// Validates optional payment notes.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    match notes {
        Some(n) if n.chars().count() > MAX_NOTES_LEN => Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_SALE_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Employee: Record Sale                                                  │
/// │                                                                         │
/// │  User enters quantity: 5                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       └── OK → stock check                                             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_SALE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_SALE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Example
/// ```rust
/// use shopbook_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("price_client", 1099).is_ok());
/// assert!(validate_price_cents("price_client", 0).is_ok());
/// assert!(validate_price_cents("price_client", -100).is_err());
/// assert!(validate_price_cents("price_client", i64::MAX / 2).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a stock level set by an admin.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a payment amount in cents.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
