//! # Request Context
//!
//! The authenticated identity of one request, extracted from the bearer
//! token before any handler runs.
//!
//! ```text
//! Authorization: Bearer <jwt>
//!      │
//!      ▼
//! signature + exp valid? ──── no ──► 401
//!      │
//!      ▼
//! sessions row (jti) exists and not expired? ── no ──► 401
//!      │
//!      ▼
//! reload account (role, category, blocked flag)
//!      │
//!      ▼
//! blocked or expired? ── yes ──► 401
//!      │
//!      ▼
//! RequestContext { account, session_id }
//! ```

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use shopbook_core::access::{check, ensure_active, Capability};
use shopbook_core::{AccessError, Account, Role};
use tracing::debug;

use crate::auth::extract_bearer_token;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub account: Account,
    pub session_id: String,
}

impl RequestContext {
    /// Runs the capability check for an operation.
    pub fn require(&self, capability: Capability<'_>) -> ApiResult<()> {
        check(&self.account, &capability).map_err(|e| {
            debug!(account_id = %self.account.id, role = %self.account.role, "Capability check failed");
            ApiError::from(e)
        })
    }

    /// Requires one of `roles` and returns the owner id the caller works for.
    pub fn require_store(&self, roles: &[Role]) -> ApiResult<&str> {
        self.require(Capability::any_of(roles))?;
        self.account
            .effective_owner_id()
            .ok_or_else(|| AccessError::Forbidden.into())
    }
}

impl FromRequestParts<Arc<AppState>> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let unauthenticated = || ApiError::from(AccessError::Unauthenticated);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(unauthenticated)?;

        let claims = state.jwt.validate_token(token)?;
        let now = Utc::now();

        let session = state
            .db
            .sessions()
            .get(&claims.jti)
            .await?
            .filter(|s| s.account_id == claims.sub)
            .ok_or_else(unauthenticated)?;

        if session.is_expired(now) {
            state.db.sessions().delete(&session.id).await?;
            return Err(unauthenticated());
        }

        let account = state
            .db
            .accounts()
            .get_by_id(&session.account_id)
            .await?
            .ok_or_else(unauthenticated)?;

        ensure_active(&account, now)?;

        Ok(RequestContext {
            account,
            session_id: session.id,
        })
    }
}
