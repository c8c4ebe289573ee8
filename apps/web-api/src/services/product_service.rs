//! Catalog endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use shopbook_core::access::{EDIT_CATALOG, STORE_FLOOR};
use shopbook_core::catalog::{apply_changes, new_product, ProductChanges, ProductDraft};
use shopbook_core::Product;
use tracing::info;

use crate::context::RequestContext;
use crate::error::ApiResult;
use crate::AppState;

/// `GET /api/products`
///
/// An employee sees the catalog of its admin.
pub async fn list(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ApiResult<Json<Vec<Product>>> {
    let owner_id = ctx.require_store(STORE_FLOOR)?;
    let products = state.db.products().list_for_owner(owner_id).await?;
    Ok(Json(products))
}

/// `POST /api/products`
pub async fn create(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Json(draft): Json<ProductDraft>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    ctx.require_store(EDIT_CATALOG)?;

    let product = new_product(&ctx.account, draft, Utc::now())?;
    state.db.products().insert(&product).await?;

    info!(
        owner_id = %product.owner_id,
        product_id = %product.id,
        stock = product.stock,
        "Product created"
    );
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}`
///
/// Sales already recorded keep the price they captured.
pub async fn update(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(changes): Json<ProductChanges>,
) -> ApiResult<Json<Product>> {
    let owner_id = ctx.require_store(EDIT_CATALOG)?;

    let now = Utc::now();
    let product = state
        .db
        .products()
        .update_with(&id, owner_id, |product| apply_changes(product, &changes, now))
        .await?;

    info!(product_id = %product.id, stock = product.stock, "Product updated");
    Ok(Json(product))
}
