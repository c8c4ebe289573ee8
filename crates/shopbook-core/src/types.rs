//! # Domain Types
//!
//! Core domain types used throughout Shopbook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Account      │   │    Product      │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  role           │◄──│  owner_id       │◄──│  product_id     │       │
//! │  │  parent_id ─┐   │   │  store_category │   │  unit_price     │       │
//! │  │  is_blocked │   │   │  stock          │   │  total          │       │
//! │  └─────────────┼───┘   └─────────────────┘   └────────┬────────┘       │
//! │                └─► owning admin                       │ credit +      │
//! │                                                       ▼ furniture     │
//! │                        ┌─────────────────┐   ┌─────────────────┐       │
//! │                        │ CreditPayment   │──►│     Credit      │       │
//! │                        │  (append-only)  │   │  paid/remaining │       │
//! │                        └─────────────────┘   │  status         │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary fields are stored as `*_cents` integers; accessor methods return
//! [`Money`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// Account role. Authorization is exact membership, there is no implied
/// hierarchy between roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    SuperAdmin,
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "superadmin",
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Store Category
// =============================================================================

/// The kind of store an admin runs. Scopes products, sales and credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StoreCategory {
    Clothing,
    Furniture,
    Beverage,
}

impl StoreCategory {
    pub const ALL: [StoreCategory; 3] = [
        StoreCategory::Clothing,
        StoreCategory::Furniture,
        StoreCategory::Beverage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreCategory::Clothing => "clothing",
            StoreCategory::Furniture => "furniture",
            StoreCategory::Beverage => "beverage",
        }
    }

    /// Only furniture stores finance sales on installments.
    #[inline]
    pub fn offers_credit(&self) -> bool {
        matches!(self, StoreCategory::Furniture)
    }
}

impl fmt::Display for StoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        StoreCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "store_category".to_string(),
                allowed: StoreCategory::ALL
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Account
// =============================================================================

/// A login identity: super-admin, store admin or employee.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Account {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Unique login handle.
    pub handle: String,

    /// Salted password hash (PHC string). Never leaves the server.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,

    pub display_name: String,

    pub role: Role,

    /// `None` only for super-admins.
    pub store_category: Option<StoreCategory>,

    /// Owning admin of an employee.
    pub parent_id: Option<String>,

    pub is_blocked: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// The admin whose catalog this account operates on.
    ///
    /// Admin → itself, employee → its parent, super-admin → none.
    pub fn effective_owner_id(&self) -> Option<&str> {
        match self.role {
            Role::Admin => Some(self.id.as_str()),
            Role::Employee => self.parent_id.as_deref(),
            Role::SuperAdmin => None,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in an admin's catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Admin that owns this product.
    pub owner_id: String,

    /// Always the owner's category, whatever the caller asked for.
    pub store_category: StoreCategory,

    pub name: String,

    /// Free-form grouping inside the store ("shirts", "sofas", ...).
    pub department: String,

    /// Cost price in cents.
    pub price_provider_cents: i64,

    /// Sale price in cents.
    pub price_client_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the sale price as Money.
    #[inline]
    pub fn price_client(&self) -> Money {
        Money::from_cents(self.price_client_cents)
    }

    /// Returns the cost price as Money.
    #[inline]
    pub fn price_provider(&self) -> Money {
        Money::from_cents(self.price_provider_cents)
    }

    /// Checks if there are enough units on hand.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Payment Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    #[default]
    Cash,
    Credit,
}

impl PaymentType {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentType::Cash => "Cash",
            PaymentType::Credit => "Credit",
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale. Immutable once written.
///
/// Uses the snapshot pattern: product name, unit price and category are
/// frozen at the time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub product_id: String,
    /// Admin that owns the product (the store).
    pub owner_id: String,
    /// Account that recorded the sale.
    pub recorded_by: String,
    pub product_name: String,
    pub store_category: StoreCategory,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub payment_type: PaymentType,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A sale together with the display name of the account that recorded it,
/// as shown in listings, receipts and exports.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleEntry {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub sale: Sale,
    pub recorder_name: String,
}

// =============================================================================
// Credit
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CreditStatus {
    #[default]
    Active,
    /// Balance reached zero. Terminal.
    Completed,
    /// Due date passed with a balance outstanding.
    Overdue,
}

/// Installment financing of one furniture sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Credit {
    pub id: String,
    pub sale_id: String,
    pub owner_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub product_name: String,
    pub total_cents: i64,
    pub paid_cents: i64,
    /// Always `total_cents - paid_cents`.
    pub remaining_cents: i64,
    pub installments: i64,
    pub installment_cents: i64,
    #[ts(as = "String")]
    pub next_payment_date: DateTime<Utc>,
    pub status: CreditStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Credit {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_cents(self.paid_cents)
    }

    #[inline]
    pub fn remaining(&self) -> Money {
        Money::from_cents(self.remaining_cents)
    }

    /// Installment in currency units by real division of the total
    /// (`600.00 / 4 == 150.0`). `installment_cents` is the rounded form.
    pub fn installment_amount(&self) -> f64 {
        self.total_cents as f64 / self.installments.max(1) as f64 / 100.0
    }
}

/// One payment against a credit. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CreditPayment {
    pub id: String,
    pub credit_id: String,
    pub amount_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CreditPayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Customer details captured on a sale (and on its credit, if any).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    /// Only kept for credit sales.
    #[serde(default)]
    pub address: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn account(role: Role, parent_id: Option<&str>) -> Account {
        Account {
            id: "acc-1".to_string(),
            handle: "handle".to_string(),
            password_hash: String::new(),
            display_name: "Name".to_string(),
            role,
            store_category: Some(StoreCategory::Clothing),
            parent_id: parent_id.map(str::to_string),
            is_blocked: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_owner() {
        assert_eq!(account(Role::Admin, None).effective_owner_id(), Some("acc-1"));
        assert_eq!(
            account(Role::Employee, Some("admin-9")).effective_owner_id(),
            Some("admin-9")
        );
        assert_eq!(account(Role::SuperAdmin, None).effective_owner_id(), None);
    }

    #[test]
    fn test_store_category_parse() {
        assert_eq!(
            "Furniture".parse::<StoreCategory>().unwrap(),
            StoreCategory::Furniture
        );
        assert!("groceries".parse::<StoreCategory>().is_err());
    }

    #[test]
    fn test_only_furniture_offers_credit() {
        assert!(StoreCategory::Furniture.offers_credit());
        assert!(!StoreCategory::Clothing.offers_credit());
        assert!(!StoreCategory::Beverage.offers_credit());
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let mut acc = account(Role::Admin, None);
        acc.password_hash = "$argon2id$secret".to_string();
        let json = serde_json::to_string(&acc).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"admin\""));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"superadmin\"");
    }
}
