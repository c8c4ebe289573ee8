//! # Sale Repository
//!
//! Database operations for sales.
//!
//! ## Recording a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record(recorder, request)                                              │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. SELECT product WHERE id = ? AND owner_id = <effective owner>      │
//! │         └── none → ProductNotFound                                      │
//! │    2. sales::prepare_sale (stock, total, credit)                        │
//! │    3. UPDATE products SET stock = stock - qty                           │
//! │         WHERE id = ? AND stock >= qty                                   │
//! │         └── 0 rows → InsufficientStock                                  │
//! │    4. INSERT sale                                                       │
//! │    5. INSERT credit (furniture + credit only)                           │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error → ROLLBACK: stock, sale and credit are written together     │
//! │  or not at all.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use shopbook_core::sales::{prepare_sale, PreparedSale, SaleRequest};
use shopbook_core::{Account, CoreError, Credit, Product, Sale, SaleEntry};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::product::PRODUCT_COLUMNS;

const ENTRY_SELECT: &str = r#"
    SELECT
        s.id, s.product_id, s.owner_id, s.recorded_by, s.product_name,
        s.store_category, s.quantity, s.unit_price_cents, s.total_cents,
        s.customer_name, s.customer_phone, s.payment_type, s.created_at,
        a.display_name AS recorder_name
    FROM sales s
    INNER JOIN accounts a ON a.id = s.recorded_by
"#;

/// Which sales a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleScope<'a> {
    /// Every sale of a store (admin view, export).
    Owner(&'a str),
    /// Only the sales an account recorded (employee view).
    RecordedBy(&'a str),
}

impl<'a> SaleScope<'a> {
    /// Admins see their store, employees see their own sales.
    pub fn for_account(account: &'a Account) -> Self {
        match account.role {
            shopbook_core::Role::Employee => SaleScope::RecordedBy(&account.id),
            _ => SaleScope::Owner(&account.id),
        }
    }

    fn filter(self) -> (&'static str, &'a str) {
        match self {
            SaleScope::Owner(id) => ("s.owner_id = ?", id),
            SaleScope::RecordedBy(id) => ("s.recorded_by = ?", id),
        }
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale (and its credit, if any) atomically.
    ///
    /// ## Errors
    /// - `Domain(ProductNotFound)` - not in the recorder's store
    /// - `Domain(InsufficientStock)` - stock below quantity, nothing written
    /// - `Domain(Validation)` - bad quantity or customer data
    pub async fn record(
        &self,
        recorder: &Account,
        request: &SaleRequest,
        now: DateTime<Utc>,
    ) -> DbResult<PreparedSale> {
        let owner_id = recorder
            .effective_owner_id()
            .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND owner_id = ?2"
        ))
        .bind(&request.product_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

        let prepared = prepare_sale(&product, request, recorder, now)?;

        let decremented = sqlx::query(
            r#"
            UPDATE products SET
                stock = stock - ?2,
                updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            "#,
        )
        .bind(&product.id)
        .bind(prepared.sale.quantity)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: prepared.sale.quantity,
            }
            .into());
        }

        insert_sale(&mut tx, &prepared.sale).await?;
        if let Some(credit) = &prepared.credit {
            insert_credit(&mut tx, credit).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %prepared.sale.id,
            product_id = %product.id,
            quantity = prepared.sale.quantity,
            total_cents = prepared.sale.total_cents,
            credit = prepared.credit.is_some(),
            "Sale recorded"
        );
        Ok(prepared)
    }

    /// Gets one sale with its recorder's name, if visible in `scope`.
    pub async fn get_entry(&self, id: &str, scope: SaleScope<'_>) -> DbResult<Option<SaleEntry>> {
        let (filter, scope_id) = scope.filter();

        let entry = sqlx::query_as::<_, SaleEntry>(&format!(
            "{ENTRY_SELECT} WHERE s.id = ? AND {filter}"
        ))
        .bind(id)
        .bind(scope_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Lists sales visible in `scope`, newest first.
    pub async fn list_entries(&self, scope: SaleScope<'_>) -> DbResult<Vec<SaleEntry>> {
        let (filter, scope_id) = scope.filter();

        let entries = sqlx::query_as::<_, SaleEntry>(&format!(
            "{ENTRY_SELECT} WHERE {filter} ORDER BY s.created_at DESC"
        ))
        .bind(scope_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(?scope, count = entries.len(), "Listed sales");
        Ok(entries)
    }
}

async fn insert_sale(tx: &mut Transaction<'_, Sqlite>, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, product_id, owner_id, recorded_by, product_name, store_category,
            quantity, unit_price_cents, total_cents, customer_name, customer_phone,
            payment_type, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.product_id)
    .bind(&sale.owner_id)
    .bind(&sale.recorded_by)
    .bind(&sale.product_name)
    .bind(sale.store_category)
    .bind(sale.quantity)
    .bind(sale.unit_price_cents)
    .bind(sale.total_cents)
    .bind(&sale.customer_name)
    .bind(&sale.customer_phone)
    .bind(sale.payment_type)
    .bind(sale.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_credit(tx: &mut Transaction<'_, Sqlite>, credit: &Credit) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO credits (
            id, sale_id, owner_id, customer_name, customer_phone, customer_address,
            product_name, total_cents, paid_cents, remaining_cents, installments,
            installment_cents, next_payment_date, status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        "#,
    )
    .bind(&credit.id)
    .bind(&credit.sale_id)
    .bind(&credit.owner_id)
    .bind(&credit.customer_name)
    .bind(&credit.customer_phone)
    .bind(&credit.customer_address)
    .bind(&credit.product_name)
    .bind(credit.total_cents)
    .bind(credit.paid_cents)
    .bind(credit.remaining_cents)
    .bind(credit.installments)
    .bind(credit.installment_cents)
    .bind(credit.next_payment_date)
    .bind(credit.status)
    .bind(credit.created_at)
    .bind(credit.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use crate::{Database, DbConfig, DbError};
    use chrono::Duration;
    use shopbook_core::catalog::{apply_changes, ProductChanges};
    use shopbook_core::{CreditStatus, CustomerInfo, PaymentType, StoreCategory};

    fn request(product: &Product, quantity: i64, payment_type: PaymentType) -> SaleRequest {
        SaleRequest {
            product_id: product.id.clone(),
            quantity,
            customer: CustomerInfo {
                name: "Ana".to_string(),
                phone: "5551234".to_string(),
                address: Some("Calle 1".to_string()),
            },
            payment_type,
            installments: Some(4),
        }
    }

    async fn credit_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM credits")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_cash_sale_decrements_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = fixtures::admin(&db, "store", StoreCategory::Clothing).await;
        let clerk = fixtures::employee(&db, "clerk", &admin).await;
        let product = fixtures::product(&db, &admin, 10_000, 10).await;

        let prepared = db
            .sales()
            .record(&clerk, &request(&product, 3, PaymentType::Cash), Utc::now())
            .await
            .unwrap();

        assert_eq!(prepared.sale.total_cents, 30_000);
        assert!(prepared.credit.is_none());

        let stored = db.products().get_for_owner(&product.id, &admin.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 7);
        assert_eq!(credit_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_furniture_credit_sale_writes_credit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = fixtures::admin(&db, "store", StoreCategory::Furniture).await;
        let product = fixtures::product(&db, &admin, 60_000, 2).await;

        let prepared = db
            .sales()
            .record(&admin, &request(&product, 1, PaymentType::Credit), Utc::now())
            .await
            .unwrap();

        let credit = db
            .credits()
            .get_for_owner(&prepared.credit.unwrap().id, &admin.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credit.installment_cents, 15_000);
        assert_eq!(credit.remaining_cents, 60_000);
        assert_eq!(credit.status, CreditStatus::Active);
    }

    #[tokio::test]
    async fn test_oversell_leaves_everything_unchanged() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = fixtures::admin(&db, "store", StoreCategory::Furniture).await;
        let product = fixtures::product(&db, &admin, 60_000, 1).await;

        let err = db
            .sales()
            .record(&admin, &request(&product, 2, PaymentType::Credit), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));

        let stored = db.products().get_for_owner(&product.id, &admin.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 1);
        assert!(db.sales().list_entries(SaleScope::Owner(&admin.id)).await.unwrap().is_empty());
        assert_eq!(credit_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_foreign_product_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = fixtures::admin(&db, "a", StoreCategory::Clothing).await;
        let b = fixtures::admin(&db, "b", StoreCategory::Clothing).await;
        let b_clerk = fixtures::employee(&db, "b-clerk", &b).await;
        let product = fixtures::product(&db, &a, 1_000, 5).await;

        let err = db
            .sales()
            .record(&b_clerk, &request(&product, 1, PaymentType::Cash), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_unit_price_is_captured() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = fixtures::admin(&db, "store", StoreCategory::Beverage).await;
        let product = fixtures::product(&db, &admin, 250, 50).await;

        let prepared = db
            .sales()
            .record(&admin, &request(&product, 4, PaymentType::Cash), Utc::now())
            .await
            .unwrap();

        let changes = ProductChanges {
            price_client_cents: Some(400),
            ..Default::default()
        };
        db.products()
            .update_with(&product.id, &admin.id, |p| apply_changes(p, &changes, Utc::now()))
            .await
            .unwrap();

        let entry = db
            .sales()
            .get_entry(&prepared.sale.id, SaleScope::Owner(&admin.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.sale.unit_price_cents, 250);
        assert_eq!(entry.sale.total_cents, 1_000);
        assert_eq!(entry.recorder_name, admin.display_name);
    }

    #[tokio::test]
    async fn test_listing_scopes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = fixtures::admin(&db, "store", StoreCategory::Clothing).await;
        let ana = fixtures::employee(&db, "ana", &admin).await;
        let luis = fixtures::employee(&db, "luis", &admin).await;
        let product = fixtures::product(&db, &admin, 1_000, 10).await;

        let t0 = Utc::now();
        db.sales()
            .record(&ana, &request(&product, 1, PaymentType::Cash), t0)
            .await
            .unwrap();
        let luis_sale = db
            .sales()
            .record(&luis, &request(&product, 1, PaymentType::Cash), t0 + Duration::seconds(1))
            .await
            .unwrap();

        let store = db.sales().list_entries(SaleScope::for_account(&admin)).await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store[0].sale.id, luis_sale.sale.id);

        let own = db.sales().list_entries(SaleScope::for_account(&ana)).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].recorder_name, ana.display_name);

        assert!(db
            .sales()
            .get_entry(&luis_sale.sale.id, SaleScope::for_account(&ana))
            .await
            .unwrap()
            .is_none());
    }
}
