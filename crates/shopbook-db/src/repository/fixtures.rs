//! Seed helpers shared by the repository tests.

use chrono::{Duration, Utc};
use shopbook_core::catalog::{new_product, ProductDraft};
use shopbook_core::{Account, Product, Role, StoreCategory};
use uuid::Uuid;

use crate::repository::session::Session;
use crate::Database;

pub fn account(handle: &str, role: Role, parent: Option<&Account>) -> Account {
    Account {
        id: Uuid::new_v4().to_string(),
        handle: handle.to_string(),
        password_hash: format!("$argon2id$fixture${handle}"),
        display_name: handle.to_uppercase(),
        role,
        store_category: match role {
            Role::SuperAdmin => None,
            _ => Some(
                parent
                    .and_then(|p| p.store_category)
                    .unwrap_or(StoreCategory::Furniture),
            ),
        },
        parent_id: parent.map(|p| p.id.clone()),
        is_blocked: false,
        created_at: Utc::now(),
    }
}

pub async fn superadmin(db: &Database) -> Account {
    let root = account("root", Role::SuperAdmin, None);
    db.accounts().insert(&root).await.unwrap();
    root
}

pub async fn admin(db: &Database, handle: &str, category: StoreCategory) -> Account {
    let mut admin = account(handle, Role::Admin, None);
    admin.store_category = Some(category);
    db.accounts().insert(&admin).await.unwrap();
    admin
}

pub async fn employee(db: &Database, handle: &str, admin: &Account) -> Account {
    let employee = account(handle, Role::Employee, Some(admin));
    db.accounts().insert(&employee).await.unwrap();
    employee
}

pub async fn product(db: &Database, owner: &Account, price_cents: i64, stock: i64) -> Product {
    let product = new_product(
        owner,
        ProductDraft {
            name: format!("Item {}", &Uuid::new_v4().to_string()[..8]),
            department: "general".to_string(),
            price_provider_cents: price_cents / 2,
            price_client_cents: price_cents,
            stock,
        },
        Utc::now(),
    )
    .unwrap();
    db.products().insert(&product).await.unwrap();
    product
}

pub async fn session(db: &Database, account: &Account) -> Session {
    let now = Utc::now();
    let session = Session {
        id: Uuid::new_v4().to_string(),
        account_id: account.id.clone(),
        created_at: now,
        expires_at: now + Duration::hours(8),
    };
    db.sessions().insert(&session).await.unwrap();
    session
}
