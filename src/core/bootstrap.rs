use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;

/// Makes sure the configured first admin exists and knows the configured password.
pub(crate) async fn ensure_first_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin bootstrap");
        return Ok(());
    }

    let username = &admin.first_admin_username;
    let now = primitive_now_utc();

    match repositories::admins::find_by_username(state.db(), username).await? {
        Some(existing) => {
            let verified =
                security::verify_password(&admin.first_admin_password, &existing.hashed_password)
                    .unwrap_or(false);
            if verified {
                tracing::info!(%username, "Default admin already up to date");
                return Ok(());
            }

            let hashed = security::hash_password(&admin.first_admin_password)?;
            repositories::admins::update_password(state.db(), existing.id, &hashed, now).await?;
            tracing::info!(%username, "Updated default admin password");
        }
        None => {
            let hashed = security::hash_password(&admin.first_admin_password)?;
            repositories::admins::create(state.db(), username, &hashed, now).await?;
            tracing::info!(%username, "Created default admin");
        }
    }

    Ok(())
}
