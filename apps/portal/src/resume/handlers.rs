use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeDocument, Section, SectionItem, SkillCategory, Template};
use crate::models::user::UserProfile;
use crate::resume::completeness::{
    completion_percentage, compute_completion_report, CompletionReport,
};
use crate::resume::ResumeManager;
use crate::routes::UserIdQuery;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ResumeSummary {
    pub id: Uuid,
    pub name: String,
    pub template: Template,
    pub last_modified: DateTime<Utc>,
    pub completion: u8,
}

#[derive(Serialize)]
pub struct ResumeListResponse {
    pub resumes: Vec<ResumeSummary>,
    pub current_id: Option<Uuid>,
    pub selected_template: Template,
}

#[derive(Serialize)]
pub struct CurrentResumeResponse {
    pub resume: ResumeDocument,
    pub completion: CompletionReport,
}

impl CurrentResumeResponse {
    fn from_manager(manager: &ResumeManager) -> Result<Self, AppError> {
        let resume = manager.current().cloned().ok_or(AppError::NoActiveResume)?;
        let completion = compute_completion_report(&resume);
        Ok(CurrentResumeResponse { resume, completion })
    }
}

#[derive(Deserialize, Default)]
pub struct CreateResumeRequest {
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct FieldValue {
    pub value: Value,
}

#[derive(Deserialize)]
pub struct SkillRequest {
    pub value: String,
}

#[derive(Deserialize)]
pub struct TemplateRequest {
    pub template: Template,
}

#[derive(Serialize)]
pub struct ItemCreated {
    pub id: Uuid,
}

#[derive(Serialize)]
pub struct Removed {
    pub removed: bool,
}

#[derive(Serialize)]
pub struct SkillsResponse {
    pub changed: bool,
    pub removed: Option<String>,
    pub skills: Vec<String>,
}

/// Parses an optional JSON body; an empty body is `None`.
fn optional_json<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<Option<T>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeListResponse>, AppError> {
    let response = state
        .sessions
        .read(params.user_id, |s| ResumeListResponse {
            resumes: s
                .resume
                .saved()
                .iter()
                .map(|doc| ResumeSummary {
                    id: doc.id,
                    name: doc.name.clone(),
                    template: doc.template,
                    last_modified: doc.last_modified,
                    completion: completion_percentage(doc),
                })
                .collect(),
            current_id: s.resume.current().map(|doc| doc.id),
            selected_template: s.resume.selected_template(),
        })
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/resumes
pub async fn handle_create_resume(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<CurrentResumeResponse>), AppError> {
    let req: CreateResumeRequest = optional_json(&body)?.unwrap_or_default();
    let response = state
        .sessions
        .update(params.user_id, |s| {
            s.resume.create_new(req.name.as_deref());
            CurrentResumeResponse::from_manager(&s.resume)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/resumes/current
pub async fn handle_get_current(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CurrentResumeResponse>, AppError> {
    let response = state
        .sessions
        .read(params.user_id, |s| CurrentResumeResponse::from_manager(&s.resume))
        .await??;
    Ok(Json(response))
}

/// GET /api/v1/resumes/current/completion
pub async fn handle_completion(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CompletionReport>, AppError> {
    let report = state
        .sessions
        .read(params.user_id, |s| s.resume.completion_report())
        .await?
        .ok_or(AppError::NoActiveResume)?;
    Ok(Json(report))
}

/// POST /api/v1/resumes/current/save
pub async fn handle_save(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeDocument>, AppError> {
    let saved = state
        .sessions
        .update(params.user_id, |s| s.resume.save())
        .await?;
    Ok(Json(saved))
}

/// POST /api/v1/resumes/:id/load
pub async fn handle_load(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CurrentResumeResponse>, AppError> {
    let response = state
        .sessions
        .update(params.user_id, |s| {
            s.resume.load(id)?;
            CurrentResumeResponse::from_manager(&s.resume)
        })
        .await?;
    Ok(Json(response))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Removed>, AppError> {
    let removed = state
        .sessions
        .update(params.user_id, |s| Ok(s.resume.delete(id)))
        .await?;
    Ok(Json(Removed { removed }))
}

/// PUT /api/v1/resumes/current/fields/:field
pub async fn handle_set_field(
    State(state): State<AppState>,
    Path(field): Path<String>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<FieldValue>,
) -> Result<Json<CurrentResumeResponse>, AppError> {
    let response = state
        .sessions
        .update(params.user_id, |s| {
            s.resume.set_field(&field, req.value)?;
            CurrentResumeResponse::from_manager(&s.resume)
        })
        .await?;
    Ok(Json(response))
}

/// PUT /api/v1/resumes/current/fields/:field/:nested
pub async fn handle_set_nested_field(
    State(state): State<AppState>,
    Path((parent, field)): Path<(String, String)>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<FieldValue>,
) -> Result<Json<CurrentResumeResponse>, AppError> {
    let response = state
        .sessions
        .update(params.user_id, |s| {
            s.resume.set_nested_field(&parent, &field, req.value)?;
            CurrentResumeResponse::from_manager(&s.resume)
        })
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/resumes/current/sections/:section
/// The body is an optional item record; without one a blank item is added.
pub async fn handle_add_item(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Query(params): Query<UserIdQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<ItemCreated>), AppError> {
    let section: Section = section.parse()?;
    let item = optional_json::<Value>(&body)?
        .map(|value| SectionItem::from_json(section, value))
        .transpose()?;
    let id = state
        .sessions
        .update(params.user_id, |s| s.resume.add_item(section, item))
        .await?;
    Ok((StatusCode::CREATED, Json(ItemCreated { id })))
}

/// PATCH /api/v1/resumes/current/sections/:section/:item_id
pub async fn handle_update_item(
    State(state): State<AppState>,
    Path((section, item_id)): Path<(String, Uuid)>,
    Query(params): Query<UserIdQuery>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Json<CurrentResumeResponse>, AppError> {
    let section: Section = section.parse()?;
    let response = state
        .sessions
        .update(params.user_id, |s| {
            s.resume.update_item(section, item_id, &patch)?;
            CurrentResumeResponse::from_manager(&s.resume)
        })
        .await?;
    Ok(Json(response))
}

/// DELETE /api/v1/resumes/current/sections/:section/:item_id
pub async fn handle_remove_item(
    State(state): State<AppState>,
    Path((section, item_id)): Path<(String, Uuid)>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Removed>, AppError> {
    let section: Section = section.parse()?;
    let removed = state
        .sessions
        .update(params.user_id, |s| s.resume.remove_item(section, item_id))
        .await?;
    Ok(Json(Removed { removed }))
}

fn skills_of(manager: &ResumeManager, category: SkillCategory) -> Vec<String> {
    manager
        .current()
        .map(|doc| doc.skills.bucket(category).clone())
        .unwrap_or_default()
}

/// POST /api/v1/resumes/current/skills/:category
pub async fn handle_add_skill(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<SkillRequest>,
) -> Result<Json<SkillsResponse>, AppError> {
    let category: SkillCategory = category.parse()?;
    let response = state
        .sessions
        .update(params.user_id, |s| {
            let changed = s.resume.add_skill(category, &req.value)?;
            Ok(SkillsResponse {
                changed,
                removed: None,
                skills: skills_of(&s.resume, category),
            })
        })
        .await?;
    Ok(Json(response))
}

/// DELETE /api/v1/resumes/current/skills/:category/:index
pub async fn handle_remove_skill(
    State(state): State<AppState>,
    Path((category, index)): Path<(String, usize)>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<SkillsResponse>, AppError> {
    let category: SkillCategory = category.parse()?;
    let response = state
        .sessions
        .update(params.user_id, |s| {
            let removed = s.resume.remove_skill(category, index)?;
            Ok(SkillsResponse {
                changed: removed.is_some(),
                removed,
                skills: skills_of(&s.resume, category),
            })
        })
        .await?;
    Ok(Json(response))
}

/// PUT /api/v1/resumes/current/template
pub async fn handle_change_template(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<TemplateRequest>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .update(params.user_id, |s| {
            s.resume.change_template(req.template);
            Ok(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/current/import
pub async fn handle_import_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(profile): Json<UserProfile>,
) -> Result<Json<CurrentResumeResponse>, AppError> {
    let response = state
        .sessions
        .update(params.user_id, |s| {
            s.resume.import_from_profile(&profile);
            CurrentResumeResponse::from_manager(&s.resume)
        })
        .await?;
    Ok(Json(response))
}
