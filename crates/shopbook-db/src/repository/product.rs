//! # Product Repository
//!
//! Database operations for products. Every read and write is scoped by
//! `owner_id`: a product of another store is reported as missing.
//!
//! ## Stock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Who changes stock?                                                     │
//! │                                                                         │
//! │  Admin edit    ──► update_with()   stock = value (validated >= 0)       │
//! │  Recorded sale ──► SaleRepository  stock = stock - qty                  │
//! │                                    WHERE stock >= qty                   │
//! │                                                                         │
//! │  Both run inside a transaction; the CHECK (stock >= 0) column           │
//! │  constraint is the last line.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use shopbook_core::{CoreResult, Product};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

pub(crate) const PRODUCT_COLUMNS: &str = "id, owner_id, store_category, name, department, \
     price_provider_cents, price_client_cents, stock, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let catalog = repo.list_for_owner(&admin.id).await?;
/// let sofa = repo.get_for_owner(&sofa_id, &admin.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product built by `catalog::new_product`.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(owner_id = %product.owner_id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, owner_id, store_category, name, department,
                price_provider_cents, price_client_cents, stock,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.owner_id)
        .bind(product.store_category)
        .bind(&product.name)
        .bind(&product.department)
        .bind(product.price_provider_cents)
        .bind(product.price_client_cents)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product of `owner_id`.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found in this store
    /// * `Ok(None)` - Missing, or owned by another store
    pub async fn get_for_owner(&self, id: &str, owner_id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND owner_id = ?2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists a store's catalog sorted by department, then name.
    pub async fn list_for_owner(&self, owner_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE owner_id = ?1 \
             ORDER BY department COLLATE NOCASE, name COLLATE NOCASE"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(owner_id = %owner_id, count = products.len(), "Listed products");
        Ok(products)
    }

    /// Loads a product, lets `edit` change it, and writes it back in one
    /// transaction. Nothing is written if `edit` fails.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let product = db
    ///     .products()
    ///     .update_with(&id, &admin.id, |p| catalog::apply_changes(p, &changes, now))
    ///     .await?;
    /// ```
    pub async fn update_with<F>(&self, id: &str, owner_id: &str, edit: F) -> DbResult<Product>
    where
        F: FnOnce(&mut Product) -> CoreResult<()>,
    {
        let mut tx = self.pool.begin().await?;

        let mut product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND owner_id = ?2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))?;

        edit(&mut product)?;

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?3,
                department = ?4,
                price_provider_cents = ?5,
                price_client_cents = ?6,
                stock = ?7,
                updated_at = ?8
            WHERE id = ?1 AND owner_id = ?2
            "#,
        )
        .bind(&product.id)
        .bind(&product.owner_id)
        .bind(&product.name)
        .bind(&product.department)
        .bind(product.price_provider_cents)
        .bind(product.price_client_cents)
        .bind(product.stock)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(id = %id, stock = product.stock, "Product updated");
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use crate::{Database, DbConfig};
    use chrono::Utc;
    use shopbook_core::catalog::{apply_changes, ProductChanges};
    use shopbook_core::{CoreError, StoreCategory};

    #[tokio::test]
    async fn test_products_are_owner_scoped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = fixtures::admin(&db, "a", StoreCategory::Clothing).await;
        let b = fixtures::admin(&db, "b", StoreCategory::Clothing).await;
        let shirt = fixtures::product(&db, &a, 1_500, 4).await;

        assert!(db.products().get_for_owner(&shirt.id, &a.id).await.unwrap().is_some());
        assert!(db.products().get_for_owner(&shirt.id, &b.id).await.unwrap().is_none());
        assert_eq!(db.products().list_for_owner(&a.id).await.unwrap().len(), 1);
        assert!(db.products().list_for_owner(&b.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_with_persists_changes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = fixtures::admin(&db, "a", StoreCategory::Beverage).await;
        let lager = fixtures::product(&db, &a, 300, 24).await;

        let changes = ProductChanges {
            stock: Some(48),
            ..Default::default()
        };
        db.products()
            .update_with(&lager.id, &a.id, |p| apply_changes(p, &changes, Utc::now()))
            .await
            .unwrap();

        let stored = db.products().get_for_owner(&lager.id, &a.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 48);
        assert_eq!(stored.price_client_cents, 300);
    }

    #[tokio::test]
    async fn test_rejected_edit_writes_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = fixtures::admin(&db, "a", StoreCategory::Beverage).await;
        let lager = fixtures::product(&db, &a, 300, 24).await;

        let changes = ProductChanges {
            stock: Some(-1),
            ..Default::default()
        };
        let err = db
            .products()
            .update_with(&lager.id, &a.id, |p| apply_changes(p, &changes, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let stored = db.products().get_for_owner(&lager.id, &a.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 24);
    }

    #[tokio::test]
    async fn test_update_foreign_product_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = fixtures::admin(&db, "a", StoreCategory::Clothing).await;
        let b = fixtures::admin(&db, "b", StoreCategory::Clothing).await;
        let shirt = fixtures::product(&db, &a, 1_500, 4).await;

        let err = db
            .products()
            .update_with(&shirt.id, &b.id, |_| Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
