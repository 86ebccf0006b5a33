use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::comparison::report::{build_comparison, ComparisonReport};
use crate::comparison::selector::{Selection, Toggle};
use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::resumes::handlers::{present, MARKDOWN_CONTENT_TYPE};
use crate::resumes::report::render_comparison_md;
use crate::session::CurrentSession;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub resume_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonView {
    pub selected: Vec<ResumeRecord>,
    /// Present once two resumes are selected.
    pub report: Option<ComparisonReport>,
}

#[derive(Serialize)]
pub struct ToggleResponse {
    pub toggle: Toggle,
    #[serde(flatten)]
    pub view: ComparisonView,
}

/// GET /api/v1/compare
pub async fn handle_view(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<ComparisonView>, AppError> {
    let selection = current_selection(&state, &session).await?;
    let selection = refresh(&state, &session, &selection).await?;
    Ok(Json(view(&state, &session, &selection)))
}

/// POST /api/v1/compare/toggle
pub async fn handle_toggle(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, AppError> {
    let id = req.resume_id;
    let record = state.repository().load(&id).await?;

    let result = state
        .sessions
        .with_selection(session.token, |selection| match record {
            Some(record) => selection
                .toggle(record)
                .map(|toggle| (toggle, selection.clone()))
                .map_err(AppError::from),
            // A deleted record can still be deselected.
            None if selection.remove(&id) => Ok((Toggle::Deselected, selection.clone())),
            None => Err(AppError::NotFound(format!("Resume {id} not found"))),
        })
        .await
        .ok_or(AppError::Unauthorized)?;
    let (toggle, selection) = result?;
    let selection = refresh(&state, &session, &selection).await?;

    Ok(Json(ToggleResponse {
        toggle,
        view: view(&state, &session, &selection),
    }))
}

/// DELETE /api/v1/compare
pub async fn handle_clear(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .with_selection(session.token, Selection::clear)
        .await
        .ok_or(AppError::Unauthorized)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/compare/export
pub async fn handle_export(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<impl IntoResponse, AppError> {
    let selection = current_selection(&state, &session).await?;
    let selection = refresh(&state, &session, &selection).await?;
    let report = build_comparison(&selection).ok_or_else(|| {
        AppError::Validation("select two resumes before exporting a comparison".to_string())
    })?;
    Ok((
        [(header::CONTENT_TYPE, MARKDOWN_CONTENT_TYPE)],
        render_comparison_md(&report),
    ))
}

async fn current_selection(
    state: &AppState,
    session: &CurrentSession,
) -> Result<Selection, AppError> {
    state
        .sessions
        .selection(session.token)
        .await
        .ok_or(AppError::Unauthorized)
}

/// Reloads every pick so views reflect the stored records. Picks that no
/// longer load are dropped from the session's selection as well.
async fn refresh(
    state: &AppState,
    session: &CurrentSession,
    selection: &Selection,
) -> Result<Selection, AppError> {
    let repo = state.repository();
    let mut records = Vec::with_capacity(selection.len());
    for id in selection.ids() {
        if let Some(record) = repo.load(&id).await? {
            records.push(record);
        }
    }
    let fresh = Selection::from_records(records);

    let stale: Vec<String> = selection
        .ids()
        .into_iter()
        .filter(|id| !fresh.contains(id))
        .collect();
    if !stale.is_empty() {
        debug!("Dropping stale comparison picks {stale:?}");
        state
            .sessions
            .with_selection(session.token, |picks| {
                for id in &stale {
                    picks.remove(id);
                }
            })
            .await
            .ok_or(AppError::Unauthorized)?;
    }
    Ok(fresh)
}

fn view(state: &AppState, session: &CurrentSession, selection: &Selection) -> ComparisonView {
    ComparisonView {
        selected: selection
            .records()
            .iter()
            .cloned()
            .map(|record| present(state, &session.actor, record))
            .collect(),
        report: build_comparison(selection),
    }
}
