use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use quadra_core::decision::{decide_by_id, DecisionOutcome};
use quadra_core::identity::Identity;
use quadra_core::invitation::{issue_invitation, Invitation, NewInvitation};
use quadra_core::paths;
use quadra_core::types::Decision;
use quadra_core::RosterError;
use serde::Deserialize;
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PendingQuery {
    pub email: String,
}

/// GET /api/invitations?email=: pending invitations addressed to an email.
pub async fn list_pending(
    State(app): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<Vec<Invitation>>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let email = paths::validated_email(&query.email)?;
        store.pending_invitations_for(&email)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// POST /api/invitations: issue a pending invitation.
pub async fn create_invitation(
    State(app): State<AppState>,
    Json(body): Json<NewInvitation>,
) -> Result<(StatusCode, Json<Invitation>), AppError> {
    let store = app.store.clone();
    let invitation = tokio::task::spawn_blocking(move || issue_invitation(store.as_ref(), body))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok((StatusCode::CREATED, Json(invitation)))
}

/// GET /api/invitations/:id: one invitation, any status.
pub async fn get_invitation(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Invitation>, AppError> {
    let store = app.store.clone();
    let invitation = tokio::task::spawn_blocking(move || {
        store
            .get_invitation(&id)?
            .ok_or(RosterError::InvitationNotFound(id))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(invitation))
}

#[derive(Deserialize)]
pub struct DecisionBody {
    pub decision: Decision,
    pub actor: Identity,
}

/// POST /api/invitations/:id/decision: accept or decline.
pub async fn decide_invitation(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<DecisionBody>,
) -> Result<Json<DecisionOutcome>, AppError> {
    let Some(_guard) = app.begin_decision(&body.actor.uid) else {
        warn!(uid = %body.actor.uid, invitation = %id, "decision already in flight");
        return Err(AppError::conflict(
            "decision_in_flight",
            format!("a decision by '{}' is already in flight", body.actor.uid),
        ));
    };

    let store = app.store.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        decide_by_id(store.as_ref(), &id, body.decision, &body.actor)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(outcome))
}

/// GET /api/teams/:team_id/invitations: every invitation a team has issued.
pub async fn team_invitations(
    State(app): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<Invitation>>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        paths::validate_id(&team_id)?;
        store.team_invitations(&team_id)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
