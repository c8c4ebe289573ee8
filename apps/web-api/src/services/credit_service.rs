//! Credit ledger endpoints. Admin only.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shopbook_core::access::STORE_BACK_OFFICE;
use shopbook_core::{Credit, CreditPayment, Money};
use tracing::info;

use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub amount_cents: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A credit as the ledger shows it.
#[derive(Debug, Serialize)]
pub struct CreditView {
    #[serde(flatten)]
    pub credit: Credit,
    pub installment_amount: f64,
}

impl From<Credit> for CreditView {
    fn from(credit: Credit) -> Self {
        CreditView {
            installment_amount: credit.installment_amount(),
            credit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreditHistory {
    pub credit: CreditView,
    pub payments: Vec<CreditPayment>,
}

#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    pub credit: CreditView,
    pub payment: CreditPayment,
}

/// `GET /api/credits`
///
/// Overdue credits are flagged as part of the listing. Stores whose
/// category offers no credit get an empty list.
pub async fn list(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ApiResult<Json<Vec<CreditView>>> {
    let owner_id = ctx.require_store(STORE_BACK_OFFICE)?;

    let offers_credit = ctx
        .account
        .store_category
        .is_some_and(|category| category.offers_credit());
    if !offers_credit {
        return Ok(Json(Vec::new()));
    }

    let credits = state.db.credits().list_for_owner(owner_id, Utc::now()).await?;
    Ok(Json(credits.into_iter().map(CreditView::from).collect()))
}

/// `GET /api/credits/{id}/payments`
pub async fn history(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<Json<CreditHistory>> {
    let owner_id = ctx.require_store(STORE_BACK_OFFICE)?;

    let credits = state.db.credits();
    let credit = credits
        .get_for_owner(&id, owner_id)
        .await?
        .ok_or_else(|| ApiError::not_found("credit"))?;
    let payments = credits.payments(&credit.id).await?;

    Ok(Json(CreditHistory {
        credit: credit.into(),
        payments,
    }))
}

/// `POST /api/credits/{id}/payments`
pub async fn pay(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(request): Json<PaymentRequest>,
) -> ApiResult<(StatusCode, Json<PaymentReceipt>)> {
    let owner_id = ctx.require_store(STORE_BACK_OFFICE)?;

    let (credit, payment) = state
        .db
        .credits()
        .register_payment(
            &id,
            owner_id,
            Money::from_cents(request.amount_cents),
            request.notes,
            Utc::now(),
        )
        .await?;

    info!(
        credit_id = %credit.id,
        amount_cents = payment.amount_cents,
        status = ?credit.status,
        "Payment accepted"
    );
    Ok((
        StatusCode::CREATED,
        Json(PaymentReceipt {
            credit: credit.into(),
            payment,
        }),
    ))
}
