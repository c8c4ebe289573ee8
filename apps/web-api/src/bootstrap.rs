//! First-run provisioning of the super-admin account.

use chrono::Utc;
use shopbook_core::validation::{validate_display_name, validate_handle, validate_password};
use shopbook_core::{Account, Role};
use shopbook_db::Database;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::hash_password;
use crate::config::BootstrapConfig;
use crate::error::ApiResult;

/// Creates the configured super-admin unless one already exists.
///
/// Returns whether an account was created.
pub async fn ensure_superadmin(db: &Database, config: &BootstrapConfig) -> ApiResult<bool> {
    if db.accounts().superadmin_exists().await? {
        return Ok(false);
    }

    let Some(password) = config.password.as_deref() else {
        warn!("No super-admin exists and no bootstrap password is configured");
        return Ok(false);
    };

    validate_handle(&config.handle)?;
    validate_display_name(&config.display_name)?;
    validate_password(password)?;

    let account = Account {
        id: Uuid::new_v4().to_string(),
        handle: config.handle.trim().to_string(),
        password_hash: hash_password(password)?,
        display_name: config.display_name.trim().to_string(),
        role: Role::SuperAdmin,
        store_category: None,
        parent_id: None,
        is_blocked: false,
        created_at: Utc::now(),
    };
    db.accounts().insert(&account).await?;

    info!(handle = %account.handle, "Bootstrap super-admin created");
    Ok(true)
}
