//! Managed account administration.
//!
//! A super-admin administers admin accounts; an admin administers its own
//! employees. Accounts outside that relation are reported as not found.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shopbook_core::access::{is_expired, provision, Capability, NewAccount, MANAGE_ACCOUNTS};
use shopbook_core::validation::{validate_display_name, validate_handle, validate_password};
use shopbook_core::{Account, StoreCategory};
use shopbook_db::AccountUpdate;
use tracing::info;

use crate::auth::hash_password;
use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// An account as listed to its manager.
#[derive(Debug, Serialize)]
pub struct AccountView {
    #[serde(flatten)]
    pub account: Account,
    pub is_expired: bool,
}

impl AccountView {
    fn new(account: Account) -> Self {
        let is_expired = is_expired(&account, Utc::now());
        AccountView { account, is_expired }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub handle: String,
    pub display_name: String,
    pub password: String,
    /// Required when a super-admin creates an admin.
    #[serde(default)]
    pub store_category: Option<StoreCategory>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub handle: String,
    pub display_name: String,
    /// Left unchanged when absent or blank.
    #[serde(default)]
    pub password: Option<String>,
}

/// `GET /api/accounts`
pub async fn list(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ApiResult<Json<Vec<AccountView>>> {
    ctx.require(Capability::any_of(MANAGE_ACCOUNTS))?;

    let accounts = state.db.accounts().list_managed(&ctx.account).await?;
    Ok(Json(accounts.into_iter().map(AccountView::new).collect()))
}

/// `POST /api/accounts`
pub async fn create(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Json(request): Json<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<AccountView>)> {
    ctx.require(Capability::any_of(MANAGE_ACCOUNTS))?;

    validate_handle(&request.handle)?;
    validate_display_name(&request.display_name)?;
    validate_password(&request.password)?;

    let new = NewAccount {
        handle: request.handle,
        display_name: request.display_name,
        password_hash: hash_password(&request.password)?,
        store_category: request.store_category,
    };
    let account = provision(&ctx.account, new, Utc::now())?;
    state.db.accounts().insert(&account).await?;

    info!(
        actor_id = %ctx.account.id,
        account_id = %account.id,
        role = %account.role,
        "Account created"
    );
    Ok((StatusCode::CREATED, Json(AccountView::new(account))))
}

/// `PUT /api/accounts/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(request): Json<UpdateAccountRequest>,
) -> ApiResult<Json<AccountView>> {
    ctx.require(Capability::any_of(MANAGE_ACCOUNTS))?;
    managed(&state, &ctx, &id).await?;

    validate_handle(&request.handle)?;
    validate_display_name(&request.display_name)?;

    let password_hash = match request.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let update = AccountUpdate {
        handle: request.handle.trim().to_string(),
        display_name: request.display_name.trim().to_string(),
        password_hash,
    };
    let account = state.db.accounts().update(&id, &update).await?;

    info!(actor_id = %ctx.account.id, account_id = %id, "Account updated");
    Ok(Json(AccountView::new(account)))
}

/// `POST /api/accounts/{id}/toggle-block`
///
/// Blocking also ends every session of the account.
pub async fn toggle_block(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<Json<AccountView>> {
    ctx.require(Capability::any_of(MANAGE_ACCOUNTS))?;
    let mut account = managed(&state, &ctx, &id).await?;

    account.is_blocked = !account.is_blocked;
    state.db.accounts().set_blocked(&id, account.is_blocked).await?;

    info!(
        actor_id = %ctx.account.id,
        account_id = %id,
        blocked = account.is_blocked,
        "Account block toggled"
    );
    Ok(Json(AccountView::new(account)))
}

/// `DELETE /api/accounts/{id}`
///
/// Refused while the account owns products, sales or employees.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    ctx.require(Capability::any_of(MANAGE_ACCOUNTS))?;
    managed(&state, &ctx, &id).await?;

    state.db.accounts().delete(&id).await?;

    info!(actor_id = %ctx.account.id, account_id = %id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn managed(state: &AppState, ctx: &RequestContext, id: &str) -> ApiResult<Account> {
    state
        .db
        .accounts()
        .get_managed(&ctx.account, id)
        .await?
        .ok_or_else(|| ApiError::not_found("account"))
}
