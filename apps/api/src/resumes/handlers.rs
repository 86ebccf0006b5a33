use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::resume::{ResumeRecord, Stage};
use crate::models::user::Actor;
use crate::pipeline::engine::{Outcome, PipelineEngine, PipelineError};
use crate::pipeline::policy::Action;
use crate::resumes::listing::{filter_records, paginate, total_pages, ResumeFilter};
use crate::resumes::report::render_resume_md;
use crate::resumes::repository::StoredFile;
use crate::resumes::upload::{process_upload, UploadOutcome, UploadRequest, UploadedFile};
use crate::session::CurrentSession;
use crate::state::AppState;

pub const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub name: Option<String>,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// A stage name, or `all`.
    pub stage: Option<String>,
    pub page: Option<usize>,
}

impl ListQuery {
    fn filter(&self) -> Result<ResumeFilter, AppError> {
        let date = match non_blank(self.date.as_deref()) {
            Some(raw) => Some(
                chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| AppError::Validation(format!("invalid date '{raw}'")))?,
            ),
            None => None,
        };
        let stage = match non_blank(self.stage.as_deref()) {
            None | Some("all") => None,
            Some(raw) => Some(parse_stage(raw)?),
        };
        Ok(ResumeFilter {
            name: self.name.clone(),
            date,
            stage,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeListResponse {
    pub resumes: Vec<ResumeRecord>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Deserialize)]
pub struct StageRequest {
    pub stage: String,
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

#[derive(Deserialize, Default)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<ListQuery>,
) -> Result<Json<ResumeListResponse>, AppError> {
    let filter = query.filter()?;
    let page = query.page.unwrap_or(1);
    let page_size = state.config.page_size;

    let matched = filter_records(state.repository().list_all().await?, &filter);
    let resumes = paginate(&matched, page, page_size)
        .iter()
        .cloned()
        .map(|record| present(&state, &session.actor, record))
        .collect();

    Ok(Json(ResumeListResponse {
        resumes,
        page,
        page_size,
        total: matched.len(),
        total_pages: total_pages(matched.len(), page_size),
    }))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<ResumeRecord>, AppError> {
    let record = state.repository().require(&id).await?;
    Ok(Json(present(&state, &session.actor, record)))
}

/// POST /api/v1/resumes
pub async fn handle_upload(
    State(state): State<AppState>,
    session: CurrentSession,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadOutcome>), AppError> {
    ensure(&state, &session.actor, Action::Upload)?;

    let request = read_upload_form(multipart).await?;
    let mut outcome = process_upload(&state.repository(), state.scorer.as_ref(), request).await?;
    outcome.resume = present(&state, &session.actor, outcome.resume);

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    ensure(&state, &session.actor, Action::DeleteResume)?;

    if !state.repository().delete(&id).await? {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/resumes/:id/document
pub async fn handle_document(
    State(state): State<AppState>,
    _session: CurrentSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let repo = state.repository();
    let record = repo.require(&id).await?;
    Ok(file_response(repo.read_document(&record).await?))
}

/// GET /api/v1/resumes/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    _session: CurrentSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let repo = state.repository();
    let record = repo.require(&id).await?;
    Ok(file_response(repo.read_preview(&record).await?))
}

/// GET /api/v1/resumes/:id/report
pub async fn handle_report(
    State(state): State<AppState>,
    _session: CurrentSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state.repository().require(&id).await?;
    Ok((
        [(header::CONTENT_TYPE, MARKDOWN_CONTENT_TYPE)],
        render_resume_md(&record),
    ))
}

/// PUT /api/v1/resumes/:id/stage
pub async fn handle_set_stage(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
    Json(req): Json<StageRequest>,
) -> Result<Json<ResumeRecord>, AppError> {
    let stage = parse_stage(&req.stage)?;
    mutate(&state, &id, &session.actor, |engine, record, actor| {
        engine.set_stage(record, stage, actor)
    })
    .await
}

/// POST /api/v1/resumes/:id/comments
pub async fn handle_add_comment(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<Json<ResumeRecord>, AppError> {
    mutate(&state, &id, &session.actor, |engine, record, actor| {
        engine.add_comment(record, &req.text, actor)
    })
    .await
}

/// PATCH /api/v1/resumes/:id/comments/:index
pub async fn handle_edit_comment(
    State(state): State<AppState>,
    session: CurrentSession,
    Path((id, index)): Path<(String, usize)>,
    Json(req): Json<CommentRequest>,
) -> Result<Json<ResumeRecord>, AppError> {
    mutate(&state, &id, &session.actor, |engine, record, actor| {
        engine.edit_comment(record, index, &req.text, actor)
    })
    .await
}

/// DELETE /api/v1/resumes/:id/comments/:index?confirm=true
pub async fn handle_delete_comment(
    State(state): State<AppState>,
    session: CurrentSession,
    Path((id, index)): Path<(String, usize)>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<ResumeRecord>, AppError> {
    if !query.confirm {
        return Err(AppError::Validation(
            "deleting a comment must be confirmed with ?confirm=true".to_string(),
        ));
    }
    mutate(&state, &id, &session.actor, |engine, record, actor| {
        engine.delete_comment(record, index, actor)
    })
    .await
}

/// PUT /api/v1/resumes/:id/notes
pub async fn handle_set_notes(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(id): Path<String>,
    Json(req): Json<NotesRequest>,
) -> Result<Json<ResumeRecord>, AppError> {
    mutate(&state, &id, &session.actor, |engine, record, actor| {
        engine.set_internal_note(record, &req.notes, actor)
    })
    .await
}

/// Loads the record, applies one engine operation and persists the whole
/// record only when it changed.
async fn mutate<F>(
    state: &AppState,
    id: &str,
    actor: &Actor,
    op: F,
) -> Result<Json<ResumeRecord>, AppError>
where
    F: FnOnce(&PipelineEngine<'_>, &mut ResumeRecord, &Actor) -> Result<Outcome, PipelineError>,
{
    let repo = state.repository();
    let mut record = repo.require(id).await?;

    if op(&state.engine(), &mut record, actor)? == Outcome::Applied {
        repo.save(&record).await?;
    }

    Ok(Json(present(state, actor, record)))
}

fn ensure(state: &AppState, actor: &Actor, action: Action) -> Result<(), AppError> {
    if state.config.policy.can_perform(actor, action) {
        Ok(())
    } else {
        Err(PipelineError::PermissionDenied {
            role: actor.role,
            action,
        }
        .into())
    }
}

/// Strips internal notes for actors not allowed to read them.
pub fn present(state: &AppState, actor: &Actor, mut record: ResumeRecord) -> ResumeRecord {
    if !state.config.policy.can_perform(actor, Action::ViewNotes) {
        record.internal_notes = None;
    }
    record
}

fn parse_stage(raw: &str) -> Result<Stage, AppError> {
    Stage::parse(raw).ok_or_else(|| AppError::Validation(format!("unknown stage '{raw}'")))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn file_response(file: StoredFile) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, file.content_type)], file.data)
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadRequest, AppError> {
    let mut company_name = None;
    let mut candidate_name = None;
    let mut job_title = None;
    let mut job_description = String::new();
    let mut resume = None;
    let mut preview = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "company-name" | "candidate-name" | "job-title" | "job-description" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid {field_name}: {e}")))?;
                let value = non_blank(Some(text.as_str())).map(String::from);
                match field_name.as_str() {
                    "company-name" => company_name = value,
                    "candidate-name" => candidate_name = value,
                    "job-title" => job_title = value,
                    _ => job_description = value.unwrap_or_default(),
                }
            }
            "resume" | "preview" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(String::from);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid {field_name}: {e}")))?;
                let file = UploadedFile {
                    file_name,
                    content_type,
                    data,
                };
                if field_name == "resume" {
                    resume = Some(file);
                } else {
                    preview = Some(file);
                }
            }
            _ => {}
        }
    }

    let resume =
        resume.ok_or_else(|| AppError::Validation("missing 'resume' file".to_string()))?;

    Ok(UploadRequest {
        company_name,
        candidate_name,
        job_title,
        job_description,
        resume,
        preview: preview.filter(|file| !file.data.is_empty()),
    })
}
