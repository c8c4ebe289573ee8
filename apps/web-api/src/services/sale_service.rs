//! Sales endpoints: record, list, receipt and CSV export.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use shopbook_core::access::{STORE_BACK_OFFICE, STORE_FLOOR};
use shopbook_core::report::{export_file_name, export_sales_csv, render_receipt};
use shopbook_core::sales::SaleRequest;
use shopbook_core::{AccessError, Credit, Sale, SaleEntry};
use shopbook_db::SaleScope;
use tracing::{error, info};

use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RecordedSale {
    pub sale: Sale,
    /// Present for a credit sale of a furniture product.
    pub credit: Option<Credit>,
}

/// `POST /api/sales`
pub async fn record(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Json(request): Json<SaleRequest>,
) -> ApiResult<(StatusCode, Json<RecordedSale>)> {
    ctx.require_store(STORE_FLOOR)?;

    let prepared = state
        .db
        .sales()
        .record(&ctx.account, &request, Utc::now())
        .await?;

    info!(
        sale_id = %prepared.sale.id,
        recorded_by = %ctx.account.id,
        total_cents = prepared.sale.total_cents,
        credit = prepared.credit.is_some(),
        "Sale recorded"
    );
    Ok((
        StatusCode::CREATED,
        Json(RecordedSale {
            sale: prepared.sale,
            credit: prepared.credit,
        }),
    ))
}

/// `GET /api/sales`
///
/// Admins see every sale of their store, employees the sales they recorded.
pub async fn list(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ApiResult<Json<Vec<SaleEntry>>> {
    ctx.require_store(STORE_FLOOR)?;

    let entries = state
        .db
        .sales()
        .list_entries(SaleScope::for_account(&ctx.account))
        .await?;
    Ok(Json(entries))
}

/// `GET /api/sales/{id}/receipt`
pub async fn receipt(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_store(STORE_FLOOR)?;

    let entry = state
        .db
        .sales()
        .get_entry(&id, SaleScope::for_account(&ctx.account))
        .await?
        .ok_or_else(|| ApiError::not_found("sale"))?;

    Ok((
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_receipt(&entry),
    ))
}

/// `GET /api/sales/export`
pub async fn export(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ApiResult<impl IntoResponse> {
    let owner_id = ctx.require_store(STORE_BACK_OFFICE)?;
    let category = ctx
        .account
        .store_category
        .ok_or(AccessError::Forbidden)?;

    let entries = state
        .db
        .sales()
        .list_entries(SaleScope::Owner(owner_id))
        .await?;

    let body = export_sales_csv(&entries).map_err(|e| {
        error!(error = %e, owner_id = %owner_id, "Failed to write sales export");
        ApiError::Store
    })?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(category, Utc::now())
    );

    info!(owner_id = %owner_id, rows = entries.len(), "Sales exported");
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
