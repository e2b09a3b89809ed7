use anyhow::Result;

use crate::services::state::AppState;

pub async fn login(state: &AppState, token: &str, encrypt: bool) -> Result<()> {
    state.session().login(token, encrypt).await?;
    Ok(())
}

/// Forgets the token and every cached counter.
pub async fn logout(state: &AppState) -> Result<()> {
    state.session().logout().await?;
    Ok(())
}
