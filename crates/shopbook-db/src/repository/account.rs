//! # Account Repository
//!
//! Database operations for accounts.
//!
//! ## Delete Guard
//! ```text
//! delete(id)
//!     │
//!     ▼  BEGIN
//! count products owned, sales owned or recorded, employees
//!     │
//!     ├── any > 0 → AccountInUse, ROLLBACK (nothing written)
//!     │
//!     ▼
//! DELETE account (sessions cascade) → COMMIT
//! ```

use shopbook_core::access::manages;
use shopbook_core::{Account, CoreError, Role};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const ACCOUNT_COLUMNS: &str = "id, handle, password_hash, display_name, role, store_category, \
                               parent_id, is_blocked, created_at";

/// Editable account fields. `password_hash` is only replaced when present.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub handle: String,
    pub display_name: String,
    pub password_hash: Option<String>,
}

/// What an account still owns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnedData {
    pub products: i64,
    pub sales: i64,
    pub employees: i64,
}

impl OwnedData {
    pub fn is_empty(&self) -> bool {
        self.products == 0 && self.sales == 0 && self.employees == 0
    }

    fn describe(&self) -> String {
        format!(
            "{} product(s), {} sale(s), {} employee(s)",
            self.products, self.sales, self.employees
        )
    }
}

/// Repository for account database operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Creates a new AccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Inserts a provisioned account.
    ///
    /// ## Errors
    /// `UniqueViolation` on a handle that is already taken.
    pub async fn insert(&self, account: &Account) -> DbResult<()> {
        debug!(handle = %account.handle, role = %account.role, "Inserting account");

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, handle, password_hash, display_name, role,
                store_category, parent_id, is_blocked, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&account.id)
        .bind(&account.handle)
        .bind(&account.password_hash)
        .bind(&account.display_name)
        .bind(account.role)
        .bind(account.store_category)
        .bind(&account.parent_id)
        .bind(account.is_blocked)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_handle(e, &account.handle))?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn find_by_handle(&self, handle: &str) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE handle = ?1"
        ))
        .bind(handle.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Fetches `id` only if `actor` administers it.
    pub async fn get_managed(&self, actor: &Account, id: &str) -> DbResult<Option<Account>> {
        Ok(self
            .get_by_id(id)
            .await?
            .filter(|target| manages(actor, target)))
    }

    /// Lists the accounts `actor` administers, oldest first.
    ///
    /// Super-admin → every admin. Admin → its own employees.
    pub async fn list_managed(&self, actor: &Account) -> DbResult<Vec<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE ");

        let accounts = match actor.role {
            Role::SuperAdmin => {
                sqlx::query_as::<_, Account>(&(query + "role = 'admin' ORDER BY created_at"))
                    .fetch_all(&self.pool)
                    .await?
            }
            Role::Admin => {
                sqlx::query_as::<_, Account>(
                    &(query + "role = 'employee' AND parent_id = ?1 ORDER BY created_at"),
                )
                .bind(&actor.id)
                .fetch_all(&self.pool)
                .await?
            }
            Role::Employee => Vec::new(),
        };

        Ok(accounts)
    }

    pub async fn superadmin_exists(&self) -> DbResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE role = 'superadmin'")
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Updates handle, display name and optionally the password hash.
    pub async fn update(&self, id: &str, update: &AccountUpdate) -> DbResult<Account> {
        debug!(id = %id, "Updating account");

        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                handle = ?2,
                display_name = ?3,
                password_hash = COALESCE(?4, password_hash)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.handle.trim())
        .bind(update.display_name.trim())
        .bind(&update.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_handle(e, &update.handle))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Account", id))
    }

    /// Sets the blocked flag. Blocking also ends the account's sessions.
    pub async fn set_blocked(&self, id: &str, blocked: bool) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE accounts SET is_blocked = ?2 WHERE id = ?1")
            .bind(id)
            .bind(blocked)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        if blocked {
            sqlx::query("DELETE FROM sessions WHERE account_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!(id = %id, blocked, "Account block flag changed");
        Ok(())
    }

    /// Counts what `id` still owns.
    pub async fn owned_data(&self, id: &str) -> DbResult<OwnedData> {
        let mut conn = self.pool.acquire().await?;
        count_owned(&mut conn, id).await
    }

    /// Deletes an account that owns nothing.
    ///
    /// ## Errors
    /// `Domain(AccountInUse)` when the account still owns products, sales
    /// or employees. Nothing is deleted in that case.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let owned = count_owned(&mut tx, id).await?;
        if !owned.is_empty() {
            return Err(CoreError::AccountInUse {
                id: id.to_string(),
                what: owned.describe(),
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        tx.commit().await?;
        info!(id = %id, "Account deleted");
        Ok(())
    }
}

async fn count_owned(conn: &mut sqlx::SqliteConnection, id: &str) -> DbResult<OwnedData> {
    let (products, sales, employees): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM products WHERE owner_id = ?1),
            (SELECT COUNT(*) FROM sales WHERE owner_id = ?1 OR recorded_by = ?1),
            (SELECT COUNT(*) FROM accounts WHERE parent_id = ?1)
        "#,
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(OwnedData {
        products,
        sales,
        employees,
    })
}

fn unique_handle(err: sqlx::Error, handle: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("handle", handle.trim()),
        other => other,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = fixtures::admin(&db, "store", shopbook_core::StoreCategory::Furniture).await;

        let found = db.accounts().find_by_handle(" store ").await.unwrap().unwrap();
        assert_eq!(found.id, admin.id);
        assert_eq!(found.role, Role::Admin);
        assert!(!found.password_hash.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_handle_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        fixtures::admin(&db, "store", shopbook_core::StoreCategory::Clothing).await;

        let mut dup = fixtures::account("store", Role::Admin, None);
        dup.store_category = Some(shopbook_core::StoreCategory::Beverage);
        let err = db.accounts().insert(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_managed_scopes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let root = fixtures::superadmin(&db).await;
        let a = fixtures::admin(&db, "a", shopbook_core::StoreCategory::Clothing).await;
        let b = fixtures::admin(&db, "b", shopbook_core::StoreCategory::Beverage).await;
        fixtures::employee(&db, "a-clerk", &a).await;
        fixtures::employee(&db, "b-clerk", &b).await;

        assert_eq!(db.accounts().list_managed(&root).await.unwrap().len(), 2);

        let employees = db.accounts().list_managed(&a).await.unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].handle, "a-clerk");

        let b_clerk = db.accounts().find_by_handle("b-clerk").await.unwrap().unwrap();
        assert!(db.accounts().get_managed(&a, &b_clerk.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_password_when_absent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = fixtures::admin(&db, "store", shopbook_core::StoreCategory::Clothing).await;

        let updated = db
            .accounts()
            .update(
                &admin.id,
                &AccountUpdate {
                    handle: "store-2".to_string(),
                    display_name: "Renamed".to_string(),
                    password_hash: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.handle, "store-2");
        assert_eq!(updated.display_name, "Renamed");
        assert_eq!(updated.password_hash, admin.password_hash);
    }

    #[tokio::test]
    async fn test_delete_guard() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = fixtures::admin(&db, "store", shopbook_core::StoreCategory::Clothing).await;
        let clerk = fixtures::employee(&db, "clerk", &admin).await;

        let err = db.accounts().delete(&admin.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::AccountInUse { .. })));
        assert!(db.accounts().get_by_id(&admin.id).await.unwrap().is_some());

        db.accounts().delete(&clerk.id).await.unwrap();
        db.accounts().delete(&admin.id).await.unwrap();
        assert!(db.accounts().get_by_id(&admin.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_guard_counts_products() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = fixtures::admin(&db, "store", shopbook_core::StoreCategory::Beverage).await;
        fixtures::product(&db, &admin, 250, 10).await;

        let owned = db.accounts().owned_data(&admin.id).await.unwrap();
        assert_eq!(owned.products, 1);
        assert!(db.accounts().delete(&admin.id).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_guard_counts_recorded_sales() {
        use chrono::Utc;
        use shopbook_core::sales::SaleRequest;
        use shopbook_core::{CustomerInfo, PaymentType};

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = fixtures::admin(&db, "store", shopbook_core::StoreCategory::Clothing).await;
        let clerk = fixtures::employee(&db, "clerk", &admin).await;
        let product = fixtures::product(&db, &admin, 1_000, 5).await;

        let request = SaleRequest {
            product_id: product.id.clone(),
            quantity: 1,
            customer: CustomerInfo {
                name: "Ana".to_string(),
                phone: "5551234".to_string(),
                address: None,
            },
            payment_type: PaymentType::Cash,
            installments: None,
        };
        db.sales().record(&clerk, &request, Utc::now()).await.unwrap();

        let owned = db.accounts().owned_data(&clerk.id).await.unwrap();
        assert_eq!(owned.sales, 1);

        let err = db.accounts().delete(&clerk.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::AccountInUse { .. })));
        assert!(db.accounts().get_by_id(&clerk.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_blocking_ends_sessions() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = fixtures::admin(&db, "store", shopbook_core::StoreCategory::Clothing).await;
        let session = fixtures::session(&db, &admin).await;

        db.accounts().set_blocked(&admin.id, true).await.unwrap();

        assert!(db.accounts().get_by_id(&admin.id).await.unwrap().unwrap().is_blocked);
        assert!(db.sessions().get(&session.id).await.unwrap().is_none());
    }
}
