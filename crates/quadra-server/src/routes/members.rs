use axum::extract::{Path, State};
use axum::Json;
use quadra_core::membership::Membership;
use quadra_core::paths;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/teams/:team_id/members: the team's roster, oldest first.
pub async fn list_members(
    State(app): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<Membership>>, AppError> {
    let store = app.store.clone();
    let members = tokio::task::spawn_blocking(move || {
        paths::validate_id(&team_id)?;
        store.team_members(&team_id)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(members))
}
