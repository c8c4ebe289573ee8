//! # Sales Module
//!
//! Turns a sale request into the records the database layer must write
//! atomically.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleRequest + Product (resolved in the recorder's owner scope)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  prepare_sale ← THIS MODULE                                             │
//! │       ├── quantity / customer validation                                │
//! │       ├── stock >= quantity?          no → InsufficientStock            │
//! │       ├── total = price_client × quantity (price captured)              │
//! │       └── credit + furniture?         yes → open_credit                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PreparedSale { sale, credit }                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  shopbook-db: one transaction                                           │
//! │       decrement stock (WHERE stock >= qty) → insert sale → insert credit│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::access::acts_for;
use crate::credit::open_credit;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Account, Credit, CustomerInfo, PaymentType, Product, Sale};
use crate::validation::{validate_address, validate_customer, validate_quantity};
use crate::DEFAULT_INSTALLMENTS;

/// A sale as submitted by an admin or employee.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRequest {
    pub product_id: String,
    pub quantity: i64,
    pub customer: CustomerInfo,
    #[serde(default)]
    pub payment_type: PaymentType,
    /// Only read for furniture credit sales. Defaults to 6.
    #[serde(default)]
    pub installments: Option<i64>,
}

/// Records ready to be written in a single transaction.
#[derive(Debug, Clone)]
pub struct PreparedSale {
    pub sale: Sale,
    /// Present only for a credit sale of a furniture product.
    pub credit: Option<Credit>,
}

/// Validates and prices a sale of `product` recorded by `recorder`.
///
/// A product outside the recorder's owner scope is reported as not found.
/// A credit sale of a non-furniture product is accepted as a plain sale.
pub fn prepare_sale(
    product: &Product,
    request: &SaleRequest,
    recorder: &Account,
    now: DateTime<Utc>,
) -> CoreResult<PreparedSale> {
    if !acts_for(recorder, &product.owner_id) {
        return Err(CoreError::ProductNotFound(request.product_id.clone()));
    }

    validate_quantity(request.quantity)?;
    validate_customer(&request.customer.name, &request.customer.phone)?;

    if !product.can_sell(request.quantity) {
        return Err(CoreError::InsufficientStock {
            product: product.name.clone(),
            available: product.stock,
            requested: request.quantity,
        });
    }

    let unit_price = product.price_client();
    let total = unit_price
        .checked_quantity(request.quantity)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "total_cents".to_string(),
            min: 0,
            max: i64::MAX,
        })?;

    let sale = Sale {
        id: Uuid::new_v4().to_string(),
        product_id: product.id.clone(),
        owner_id: product.owner_id.clone(),
        recorded_by: recorder.id.clone(),
        product_name: product.name.clone(),
        store_category: product.store_category,
        quantity: request.quantity,
        unit_price_cents: unit_price.cents(),
        total_cents: total.cents(),
        customer_name: request.customer.name.trim().to_string(),
        customer_phone: request.customer.phone.trim().to_string(),
        payment_type: request.payment_type,
        created_at: now,
    };

    let credit = if request.payment_type == PaymentType::Credit
        && product.store_category.offers_credit()
    {
        if let Some(address) = request.customer.address.as_deref() {
            validate_address(address)?;
        }
        let installments = request.installments.unwrap_or(DEFAULT_INSTALLMENTS);
        Some(open_credit(&sale, installments, &request.customer, now))
    } else {
        None
    };

    Ok(PreparedSale { sale, credit })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CreditStatus, Role, StoreCategory};

    fn product(category: StoreCategory, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "prod-1".to_string(),
            owner_id: "admin-1".to_string(),
            store_category: category,
            name: "Item".to_string(),
            department: "general".to_string(),
            price_provider_cents: price_cents / 2,
            price_client_cents: price_cents,
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    fn employee_of(owner: &str) -> Account {
        Account {
            id: "emp-1".to_string(),
            handle: "clerk".to_string(),
            password_hash: String::new(),
            display_name: "Clerk".to_string(),
            role: Role::Employee,
            store_category: Some(StoreCategory::Furniture),
            parent_id: Some(owner.to_string()),
            is_blocked: false,
            created_at: Utc::now(),
        }
    }

    fn request(quantity: i64, payment_type: PaymentType, installments: Option<i64>) -> SaleRequest {
        SaleRequest {
            product_id: "prod-1".to_string(),
            quantity,
            customer: CustomerInfo {
                name: "Ana".to_string(),
                phone: "5551234".to_string(),
                address: None,
            },
            payment_type,
            installments,
        }
    }

    #[test]
    fn test_cash_sale_totals() {
        let p = product(StoreCategory::Clothing, 10_000, 10);
        let prepared =
            prepare_sale(&p, &request(3, PaymentType::Cash, None), &employee_of("admin-1"), Utc::now())
                .unwrap();

        assert_eq!(prepared.sale.total_cents, 30_000);
        assert_eq!(prepared.sale.unit_price_cents, 10_000);
        assert_eq!(prepared.sale.recorded_by, "emp-1");
        assert!(prepared.credit.is_none());
    }

    #[test]
    fn test_furniture_credit_sale_opens_credit() {
        let p = product(StoreCategory::Furniture, 60_000, 2);
        let prepared = prepare_sale(
            &p,
            &request(1, PaymentType::Credit, Some(4)),
            &employee_of("admin-1"),
            Utc::now(),
        )
        .unwrap();

        let credit = prepared.credit.unwrap();
        assert_eq!(credit.installment_cents, 15_000);
        assert_eq!(credit.remaining_cents, 60_000);
        assert_eq!(credit.status, CreditStatus::Active);
        assert_eq!(credit.sale_id, prepared.sale.id);
    }

    #[test]
    fn test_credit_defaults_to_six_installments() {
        let p = product(StoreCategory::Furniture, 60_000, 1);
        let prepared = prepare_sale(
            &p,
            &request(1, PaymentType::Credit, None),
            &employee_of("admin-1"),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(prepared.credit.unwrap().installments, 6);
    }

    #[test]
    fn test_credit_outside_furniture_is_plain_sale() {
        let p = product(StoreCategory::Beverage, 500, 5);
        let prepared = prepare_sale(
            &p,
            &request(2, PaymentType::Credit, Some(3)),
            &employee_of("admin-1"),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(prepared.sale.payment_type, PaymentType::Credit);
        assert!(prepared.credit.is_none());
    }

    #[test]
    fn test_oversell_rejected() {
        let p = product(StoreCategory::Clothing, 100, 2);
        let err = prepare_sale(&p, &request(3, PaymentType::Cash, None), &employee_of("admin-1"), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_foreign_product_is_not_found() {
        let p = product(StoreCategory::Clothing, 100, 5);
        let err = prepare_sale(&p, &request(1, PaymentType::Cash, None), &employee_of("admin-2"), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));
    }

    #[test]
    fn test_invalid_quantity_rejected() {
        let p = product(StoreCategory::Clothing, 100, 5);
        let err = prepare_sale(&p, &request(0, PaymentType::Cash, None), &employee_of("admin-1"), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_total_overflow_rejected() {
        let p = product(StoreCategory::Clothing, i64::MAX / 2, 10);
        let err = prepare_sale(&p, &request(3, PaymentType::Cash, None), &employee_of("admin-1"), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_free_furniture_credit_is_completed() {
        let p = product(StoreCategory::Furniture, 0, 1);
        let prepared = prepare_sale(
            &p,
            &request(1, PaymentType::Credit, Some(4)),
            &employee_of("admin-1"),
            Utc::now(),
        )
        .unwrap();

        let credit = prepared.credit.unwrap();
        assert_eq!(credit.remaining_cents, 0);
        assert_eq!(credit.status, CreditStatus::Completed);
    }
}
