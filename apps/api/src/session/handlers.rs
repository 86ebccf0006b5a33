use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{Actor, Role};
use crate::pipeline::policy::Action;
use crate::session::{actor_for, CurrentSession};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub role: Role,
}

#[derive(Serialize)]
pub struct SignInResponse {
    pub token: Uuid,
    pub actor: Actor,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub actor: Actor,
    /// Actions the actor's role is granted.
    pub permissions: Vec<Action>,
    pub selected: Vec<String>,
}

/// POST /api/v1/auth/sign-in
pub async fn handle_sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<(StatusCode, Json<SignInResponse>), AppError> {
    let actor = actor_for(req.user_id, req.username, req.role);
    let token = state.sessions.sign_in(actor.clone()).await;
    Ok((StatusCode::CREATED, Json(SignInResponse { token, actor })))
}

/// POST /api/v1/auth/sign-out
pub async fn handle_sign_out(
    State(state): State<AppState>,
    session: CurrentSession,
) -> StatusCode {
    state.sessions.sign_out(session.token).await;
    StatusCode::NO_CONTENT
}

/// GET /api/v1/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<MeResponse>, AppError> {
    let permissions = Action::ALL
        .into_iter()
        .filter(|action| state.config.policy.can_perform(&session.actor, *action))
        .collect();
    let selected = state
        .sessions
        .selection(session.token)
        .await
        .map(|selection| selection.records().iter().map(|r| r.id.clone()).collect())
        .unwrap_or_default();

    Ok(Json(MeResponse {
        actor: session.actor,
        permissions,
        selected,
    }))
}
