//! # Credit Module
//!
//! Installment financing of furniture sales: opening a credit, applying
//! payments and the overdue transition.
//!
//! ## Status Machine
//! ```text
//!                 payment leaves balance
//!          ┌──────────────────────────────────┐
//!          ▼                                  │
//!     ┌─────────┐   due date passed    ┌─────────────┐
//!     │ Active  │ ───────────────────► │   Overdue   │
//!     └────┬────┘   (listing sweep)    └──────┬──────┘
//!          │                                  │
//!          │ remaining <= 0                   │ remaining <= 0
//!          ▼                                  ▼
//!     ┌──────────────────────────────────────────────┐
//!     │                 Completed                    │
//!     │     terminal: further payments rejected      │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - `remaining == total - paid` after every transition
//! - `paid` never decreases
//! - `status == Completed` exactly when `remaining <= 0`

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Credit, CreditPayment, CreditStatus, CustomerInfo, Sale};
use crate::validation::{validate_notes, validate_payment_amount};
use crate::{MAX_INSTALLMENTS, MIN_INSTALLMENTS, PAYMENT_INTERVAL_DAYS};

// =============================================================================
// Schedule
// =============================================================================

/// Clamps a requested installment count into `[2, 6]`.
///
/// ## Example
/// ```rust
/// use shopbook_core::credit::clamp_installments;
///
/// assert_eq!(clamp_installments(1), 2);
/// assert_eq!(clamp_installments(4), 4);
/// assert_eq!(clamp_installments(9), 6);
/// ```
#[inline]
pub fn clamp_installments(requested: i64) -> i64 {
    requested.clamp(MIN_INSTALLMENTS, MAX_INSTALLMENTS)
}

/// Next due date counted from `from`.
#[inline]
pub fn next_due_date(from: DateTime<Utc>) -> DateTime<Utc> {
    from + Duration::days(PAYMENT_INTERVAL_DAYS)
}

/// Opens the credit that finances `sale`.
///
/// The installment amount is informational: the balance is always
/// `total - paid`, so rounding never leaves money uncollected. A credit
/// with nothing to collect opens as `Completed`.
pub fn open_credit(
    sale: &Sale,
    installments_requested: i64,
    customer: &CustomerInfo,
    now: DateTime<Utc>,
) -> Credit {
    let installments = clamp_installments(installments_requested);
    let total = sale.total();
    let status = if total.cents() <= 0 {
        CreditStatus::Completed
    } else {
        CreditStatus::Active
    };

    Credit {
        id: Uuid::new_v4().to_string(),
        sale_id: sale.id.clone(),
        owner_id: sale.owner_id.clone(),
        customer_name: customer.name.trim().to_string(),
        customer_phone: customer.phone.trim().to_string(),
        customer_address: customer
            .address
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        product_name: sale.product_name.clone(),
        total_cents: total.cents(),
        paid_cents: 0,
        remaining_cents: total.cents(),
        installments,
        installment_cents: total.split_evenly(installments).cents(),
        next_payment_date: next_due_date(now),
        status,
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// Payments
// =============================================================================

/// Applies a payment to `credit` and returns the payment record to append.
///
/// ## Rules
/// ```text
/// amount <= 0            → ValidationError (MustBePositive)
/// status == Completed    → CreditCompleted
/// amount > remaining     → Overpayment
/// remaining reaches 0    → Completed, due date untouched
/// otherwise              → Active, due date = now + 30 days
/// ```
///
/// On error `credit` is left unchanged.
pub fn apply_payment(
    credit: &mut Credit,
    amount: Money,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> CoreResult<CreditPayment> {
    validate_payment_amount(amount.cents())?;
    let notes = notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    validate_notes(notes.as_deref())?;

    if credit.status == CreditStatus::Completed {
        return Err(CoreError::CreditCompleted(credit.id.clone()));
    }

    let remaining = credit.remaining();
    if amount > remaining {
        return Err(CoreError::Overpayment {
            remaining,
            requested: amount,
        });
    }

    let paid = credit.paid() + amount;
    let remaining = credit.total() - paid;

    credit.paid_cents = paid.cents();
    credit.remaining_cents = remaining.cents();
    credit.updated_at = now;

    if remaining.cents() <= 0 {
        credit.status = CreditStatus::Completed;
    } else {
        credit.status = CreditStatus::Active;
        credit.next_payment_date = next_due_date(now);
    }

    Ok(CreditPayment {
        id: Uuid::new_v4().to_string(),
        credit_id: credit.id.clone(),
        amount_cents: amount.cents(),
        notes,
        created_at: now,
    })
}

// =============================================================================
// Overdue
// =============================================================================

/// Flags an active credit whose due date has passed. Returns whether the
/// status changed.
pub fn mark_overdue(credit: &mut Credit, now: DateTime<Utc>) -> bool {
    if credit.status == CreditStatus::Active && credit.next_payment_date < now {
        credit.status = CreditStatus::Overdue;
        credit.updated_at = now;
        return true;
    }
    false
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentType, StoreCategory};

    fn furniture_sale(total_cents: i64) -> Sale {
        Sale {
            id: "sale-1".to_string(),
            product_id: "prod-1".to_string(),
            owner_id: "admin-1".to_string(),
            recorded_by: "emp-1".to_string(),
            product_name: "Sofa".to_string(),
            store_category: StoreCategory::Furniture,
            quantity: 1,
            unit_price_cents: total_cents,
            total_cents,
            customer_name: "Ana".to_string(),
            customer_phone: "5551234".to_string(),
            payment_type: PaymentType::Credit,
            created_at: Utc::now(),
        }
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Ana".to_string(),
            phone: "5551234".to_string(),
            address: Some(" Calle 1 ".to_string()),
        }
    }

    fn open(total_cents: i64, installments: i64) -> Credit {
        open_credit(&furniture_sale(total_cents), installments, &customer(), Utc::now())
    }

    #[test]
    fn test_clamp_installments() {
        assert_eq!(clamp_installments(1), 2);
        assert_eq!(clamp_installments(9), 6);
        assert_eq!(clamp_installments(4), 4);
        assert_eq!(clamp_installments(-3), 2);
    }

    #[test]
    fn test_open_credit_schedule() {
        let now = Utc::now();
        let credit = open_credit(&furniture_sale(60_000), 4, &customer(), now);

        assert_eq!(credit.installments, 4);
        assert_eq!(credit.installment_cents, 15_000);
        assert_eq!(credit.remaining_cents, 60_000);
        assert_eq!(credit.paid_cents, 0);
        assert_eq!(credit.status, CreditStatus::Active);
        assert_eq!(credit.next_payment_date, now + Duration::days(30));
        assert_eq!(credit.customer_address, "Calle 1");
        assert_eq!(credit.sale_id, "sale-1");
    }

    #[test]
    fn test_full_payment_completes() {
        let mut credit = open(60_000, 4);
        let due_before = credit.next_payment_date;

        let payment = apply_payment(&mut credit, Money::from_cents(60_000), None, Utc::now()).unwrap();

        assert_eq!(payment.amount_cents, 60_000);
        assert_eq!(credit.paid_cents, 60_000);
        assert_eq!(credit.remaining_cents, 0);
        assert_eq!(credit.status, CreditStatus::Completed);
        assert_eq!(credit.next_payment_date, due_before);
    }

    #[test]
    fn test_partial_payment_moves_due_date() {
        let mut credit = open(60_000, 4);
        let paid_at = Utc::now() + Duration::days(3);

        apply_payment(
            &mut credit,
            Money::from_cents(20_000),
            Some("first".to_string()),
            paid_at,
        )
        .unwrap();

        assert_eq!(credit.remaining_cents, 40_000);
        assert_eq!(credit.status, CreditStatus::Active);
        assert_eq!(credit.next_payment_date, paid_at + Duration::days(30));
    }

    #[test]
    fn test_remaining_tracks_total_minus_paid() {
        let mut credit = open(10_000, 3);
        for cents in [3_333, 3_333, 3_334] {
            apply_payment(&mut credit, Money::from_cents(cents), None, Utc::now()).unwrap();
            assert_eq!(credit.remaining_cents, credit.total_cents - credit.paid_cents);
        }
        assert_eq!(credit.status, CreditStatus::Completed);
    }

    #[test]
    fn test_rejected_payments_leave_credit_unchanged() {
        let mut credit = open(60_000, 4);

        let err = apply_payment(&mut credit, Money::zero(), None, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = apply_payment(&mut credit, Money::from_cents(60_001), None, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Overpayment { .. }));

        assert_eq!(credit.paid_cents, 0);
        assert_eq!(credit.remaining_cents, 60_000);
    }

    #[test]
    fn test_completed_credit_rejects_payment() {
        let mut credit = open(20_000, 2);
        apply_payment(&mut credit, Money::from_cents(20_000), None, Utc::now()).unwrap();

        let err = apply_payment(&mut credit, Money::from_cents(1), None, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::CreditCompleted(_)));
    }

    #[test]
    fn test_overdue_transitions() {
        let mut credit = open(60_000, 4);
        let late = credit.next_payment_date + Duration::seconds(1);

        let due = credit.next_payment_date;
        assert!(!mark_overdue(&mut credit, due));
        assert!(mark_overdue(&mut credit, late));
        assert_eq!(credit.status, CreditStatus::Overdue);
        assert!(!mark_overdue(&mut credit, late));

        apply_payment(&mut credit, Money::from_cents(15_000), None, late).unwrap();
        assert_eq!(credit.status, CreditStatus::Active);
    }

    #[test]
    fn test_zero_total_opens_completed() {
        let mut credit = open(0, 4);
        assert_eq!(credit.remaining_cents, 0);
        assert_eq!(credit.status, CreditStatus::Completed);

        let late = credit.next_payment_date + Duration::days(1);
        assert!(!mark_overdue(&mut credit, late));
        let err = apply_payment(&mut credit, Money::from_cents(1), None, late).unwrap_err();
        assert!(matches!(err, CoreError::CreditCompleted(_)));
    }

    #[test]
    fn test_blank_notes_are_dropped() {
        let mut credit = open(60_000, 4);
        let payment =
            apply_payment(&mut credit, Money::from_cents(100), Some("  ".to_string()), Utc::now())
                .unwrap();
        assert_eq!(payment.notes, None);
    }
}
