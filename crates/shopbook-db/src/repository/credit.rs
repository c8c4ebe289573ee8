//! # Credit Repository
//!
//! Database operations for installment credits and their payments.
//!
//! ## Payment Transaction
//! ```text
//! register_payment(credit_id, owner_id, amount)
//!     │
//!     ▼  BEGIN
//! SELECT credit WHERE id = ? AND owner_id = ?   (none → CreditNotFound)
//!     │
//!     ▼
//! credit::apply_payment  (bounds, status, next due date)
//!     │
//!     ▼
//! UPDATE credits ... WHERE id = ? AND paid_cents = <paid before>
//!     │                 (0 rows → a concurrent payment won, retry later)
//!     ▼
//! INSERT credit_payments → COMMIT
//! ```

use chrono::{DateTime, Utc};
use shopbook_core::credit::{apply_payment, mark_overdue};
use shopbook_core::{CoreError, Credit, CreditPayment, Money};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

const CREDIT_COLUMNS: &str = "id, sale_id, owner_id, customer_name, customer_phone, \
     customer_address, product_name, total_cents, paid_cents, remaining_cents, installments, \
     installment_cents, next_payment_date, status, created_at, updated_at";

/// Repository for credit database operations.
#[derive(Debug, Clone)]
pub struct CreditRepository {
    pool: SqlitePool,
}

impl CreditRepository {
    /// Creates a new CreditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CreditRepository { pool }
    }

    pub async fn get_for_owner(&self, id: &str, owner_id: &str) -> DbResult<Option<Credit>> {
        let credit = sqlx::query_as::<_, Credit>(&format!(
            "SELECT {CREDIT_COLUMNS} FROM credits WHERE id = ?1 AND owner_id = ?2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credit)
    }

    /// Lists a store's credits, flagging overdue ones first.
    ///
    /// Active credits whose due date is before `now` are switched to
    /// overdue in the same transaction as the read, so the listing and
    /// the stored status agree.
    pub async fn list_for_owner(&self, owner_id: &str, now: DateTime<Utc>) -> DbResult<Vec<Credit>> {
        let mut tx = self.pool.begin().await?;

        let mut credits = sqlx::query_as::<_, Credit>(&format!(
            "SELECT {CREDIT_COLUMNS} FROM credits WHERE owner_id = ?1 ORDER BY next_payment_date"
        ))
        .bind(owner_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut flagged = 0usize;
        for credit in credits.iter_mut() {
            if mark_overdue(credit, now) {
                sqlx::query("UPDATE credits SET status = ?2, updated_at = ?3 WHERE id = ?1")
                    .bind(&credit.id)
                    .bind(credit.status)
                    .bind(credit.updated_at)
                    .execute(&mut *tx)
                    .await?;
                flagged += 1;
            }
        }

        tx.commit().await?;

        if flagged > 0 {
            info!(owner_id = %owner_id, flagged, "Credits marked overdue");
        }
        debug!(owner_id = %owner_id, count = credits.len(), "Listed credits");
        Ok(credits)
    }

    /// Registers a payment against a credit of `owner_id`.
    ///
    /// ## Errors
    /// - `Domain(CreditNotFound)` - missing or another store's credit
    /// - `Domain(CreditCompleted)` / `Domain(Overpayment)` - rejected, nothing written
    /// - `Domain(Validation)` - non-positive amount, notes too long
    pub async fn register_payment(
        &self,
        id: &str,
        owner_id: &str,
        amount: Money,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DbResult<(Credit, CreditPayment)> {
        let mut tx = self.pool.begin().await?;

        let mut credit = sqlx::query_as::<_, Credit>(&format!(
            "SELECT {CREDIT_COLUMNS} FROM credits WHERE id = ?1 AND owner_id = ?2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::CreditNotFound(id.to_string()))?;

        let paid_before = credit.paid_cents;
        let payment = apply_payment(&mut credit, amount, notes, now)?;

        let updated = sqlx::query(
            r#"
            UPDATE credits SET
                paid_cents = ?3,
                remaining_cents = ?4,
                next_payment_date = ?5,
                status = ?6,
                updated_at = ?7
            WHERE id = ?1 AND paid_cents = ?2
            "#,
        )
        .bind(&credit.id)
        .bind(paid_before)
        .bind(credit.paid_cents)
        .bind(credit.remaining_cents)
        .bind(credit.next_payment_date)
        .bind(credit.status)
        .bind(credit.updated_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            warn!(credit_id = %id, "Credit changed during payment");
            return Err(DbError::QueryFailed(
                "credit was modified concurrently, retry the payment".to_string(),
            ));
        }

        insert_payment(&mut tx, &payment).await?;
        tx.commit().await?;

        info!(
            credit_id = %credit.id,
            amount_cents = payment.amount_cents,
            remaining_cents = credit.remaining_cents,
            status = ?credit.status,
            "Credit payment registered"
        );
        Ok((credit, payment))
    }

    /// Payment history of one credit, oldest first.
    pub async fn payments(&self, credit_id: &str) -> DbResult<Vec<CreditPayment>> {
        let payments = sqlx::query_as::<_, CreditPayment>(
            r#"
            SELECT id, credit_id, amount_cents, notes, created_at
            FROM credit_payments
            WHERE credit_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(credit_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}

async fn insert_payment(tx: &mut Transaction<'_, Sqlite>, payment: &CreditPayment) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO credit_payments (id, credit_id, amount_cents, notes, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.credit_id)
    .bind(payment.amount_cents)
    .bind(&payment.notes)
    .bind(payment.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
