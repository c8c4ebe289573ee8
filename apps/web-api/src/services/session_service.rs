//! Session endpoints: login, current identity, logout.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopbook_core::access::{evaluate_login, home_path};
use shopbook_core::{AccessError, Account};
use tracing::{info, warn};

use crate::auth::verify_password;
use crate::context::RequestContext;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub handle: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub account: Account,
    /// Dashboard route for the account's role and store category.
    pub home: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub account: Account,
    pub home: String,
}

/// `POST /api/session`
///
/// Unknown handle and wrong password give the same answer. A matching
/// password on an expired account blocks it before the login is refused.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let now = Utc::now();
    let accounts = state.db.accounts();

    let account = match accounts.find_by_handle(&request.handle).await? {
        Some(account) if verify_password(&request.password, &account.password_hash) => account,
        _ => {
            info!(handle = %request.handle.trim(), "Login rejected");
            return Err(AccessError::InvalidCredentials.into());
        }
    };

    let decision = evaluate_login(&account, now);
    if decision.mark_blocked {
        accounts.set_blocked(&account.id, true).await?;
        warn!(account_id = %account.id, handle = %account.handle, "Account expired, blocked");
    }
    decision.outcome?;

    let sessions = state.db.sessions();
    sessions.prune_for_account(&account.id, now).await?;

    let issued = state.jwt.issue(&account.id, now)?;
    sessions.insert(&issued.session).await?;

    info!(account_id = %account.id, role = %account.role, "Login succeeded");

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.session.expires_at,
        home: home_path(&account),
        account,
    }))
}

/// `GET /api/session`
pub async fn current(ctx: RequestContext) -> Json<SessionView> {
    let home = home_path(&ctx.account);
    Json(SessionView {
        account: ctx.account,
        home,
    })
}

/// `DELETE /api/session`
pub async fn logout(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ApiResult<StatusCode> {
    state.db.sessions().delete(&ctx.session_id).await?;
    info!(account_id = %ctx.account.id, "Logged out");
    Ok(StatusCode::NO_CONTENT)
}
