//! # Catalog Module
//!
//! Building and editing products. A product always belongs to the admin
//! that created it and always carries that admin's store category.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreResult, ValidationError};
use crate::types::{Account, Product, Role};
use crate::validation::{
    validate_department, validate_price_cents, validate_product_name, validate_stock,
};

/// Fields of a new product. Any store category sent by the client is
/// ignored, the owner's category is used.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductDraft {
    pub name: String,
    pub department: String,
    pub price_provider_cents: i64,
    pub price_client_cents: i64,
    pub stock: i64,
}

/// Partial edit of a product; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub price_provider_cents: Option<i64>,
    #[serde(default)]
    pub price_client_cents: Option<i64>,
    #[serde(default)]
    pub stock: Option<i64>,
}

/// Creates a product owned by `owner`.
pub fn new_product(owner: &Account, draft: ProductDraft, now: DateTime<Utc>) -> CoreResult<Product> {
    let store_category = match (owner.role, owner.store_category) {
        (Role::Admin, Some(category)) => category,
        _ => {
            return Err(ValidationError::NotAllowed {
                field: "owner".to_string(),
                allowed: vec![Role::Admin.to_string()],
            }
            .into())
        }
    };

    validate_product_name(&draft.name)?;
    validate_department(&draft.department)?;
    validate_price_cents("price_provider_cents", draft.price_provider_cents)?;
    validate_price_cents("price_client_cents", draft.price_client_cents)?;
    validate_stock(draft.stock)?;

    Ok(Product {
        id: Uuid::new_v4().to_string(),
        owner_id: owner.id.clone(),
        store_category,
        name: draft.name.trim().to_string(),
        department: draft.department.trim().to_string(),
        price_provider_cents: draft.price_provider_cents,
        price_client_cents: draft.price_client_cents,
        stock: draft.stock,
        created_at: now,
        updated_at: now,
    })
}

/// Applies `changes` to `product`. Validates everything before touching
/// the product, so a rejected edit leaves it as it was.
pub fn apply_changes(
    product: &mut Product,
    changes: &ProductChanges,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    if let Some(name) = &changes.name {
        validate_product_name(name)?;
    }
    if let Some(department) = &changes.department {
        validate_department(department)?;
    }
    if let Some(cents) = changes.price_provider_cents {
        validate_price_cents("price_provider_cents", cents)?;
    }
    if let Some(cents) = changes.price_client_cents {
        validate_price_cents("price_client_cents", cents)?;
    }
    if let Some(stock) = changes.stock {
        validate_stock(stock)?;
    }

    if let Some(name) = &changes.name {
        product.name = name.trim().to_string();
    }
    if let Some(department) = &changes.department {
        product.department = department.trim().to_string();
    }
    if let Some(cents) = changes.price_provider_cents {
        product.price_provider_cents = cents;
    }
    if let Some(cents) = changes.price_client_cents {
        product.price_client_cents = cents;
    }
    if let Some(stock) = changes.stock {
        product.stock = stock;
    }
    product.updated_at = now;

    Ok(())
}
