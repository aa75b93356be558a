use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::board::JobPage;
use crate::jobs::filters::{Facet, JobFilterState, JobFilters, JobSort};
use crate::jobs::preferences::JobPreferences;
use crate::models::job::{Application, ApplicationStatus, JobPosting, NewJob};
use crate::routes::UserIdQuery;
use crate::state::AppState;

#[derive(Serialize)]
pub struct FilterStateResponse {
    pub state: JobFilterState,
    pub filters: JobFilters,
    pub has_active_filters: bool,
    pub recent_searches: Vec<String>,
}

impl From<&JobPreferences> for FilterStateResponse {
    fn from(prefs: &JobPreferences) -> Self {
        FilterStateResponse {
            state: prefs.filters.clone(),
            filters: prefs.filters.get_filters(),
            has_active_filters: prefs.filters.has_active_filters(),
            recent_searches: prefs.recent_searches.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct JobListResponse {
    #[serde(flatten)]
    pub page: JobPage,
    pub filters: JobFilters,
    pub sort: JobSort,
    pub has_active_filters: bool,
    pub saved_jobs: Vec<Uuid>,
}

#[derive(Deserialize)]
pub struct FacetValue {
    #[serde(default)]
    pub value: String,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Deserialize)]
pub struct PageRequest {
    pub page: u32,
}

#[derive(Deserialize)]
pub struct SortRequest {
    pub sort: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ApplyRequest {
    pub resume_id: Option<Uuid>,
    pub cover_letter: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: ApplicationStatus,
}

#[derive(Serialize)]
pub struct SavedJobResponse {
    pub saved: bool,
}

/// GET /api/v1/jobs
/// Lists postings using the caller's stored filters, sort and page.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<JobListResponse>, AppError> {
    let prefs = state
        .sessions
        .read(params.user_id, |s| s.jobs.clone())
        .await?;
    let filters = prefs.filters.get_filters();
    let page = state
        .board
        .list(
            &filters,
            prefs.filters.sort,
            prefs.filters.page,
            state.config.jobs_page_size,
        )
        .await;

    Ok(Json(JobListResponse {
        page,
        filters,
        sort: prefs.filters.sort,
        has_active_filters: prefs.filters.has_active_filters(),
        saved_jobs: prefs.saved_jobs,
    }))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobPosting>, AppError> {
    Ok(Json(state.board.get(id).await?))
}

/// POST /api/v1/jobs
pub async fn handle_post_job(
    State(state): State<AppState>,
    Json(new_job): Json<NewJob>,
) -> Result<(StatusCode, Json<JobPosting>), AppError> {
    let job = state.board.post(new_job).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_remove_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.board.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Job {id} not found")))
    }
}

/// POST /api/v1/jobs/:id/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    if let Some(resume_id) = req.resume_id {
        let owned = state
            .sessions
            .read(params.user_id, |s| {
                s.resume.saved().iter().any(|doc| doc.id == resume_id)
            })
            .await?;
        if !owned {
            return Err(AppError::NotFound(format!("Resume {resume_id} not found")));
        }
    }
    let application = state
        .board
        .apply(job_id, params.user_id, req.resume_id, req.cover_letter)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// POST /api/v1/jobs/:id/save
pub async fn handle_toggle_saved(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<SavedJobResponse>, AppError> {
    state.board.get(job_id).await?;
    let saved = state
        .sessions
        .update(params.user_id, |s| Ok(s.jobs.toggle_saved(job_id)))
        .await?;
    Ok(Json(SavedJobResponse { saved }))
}

/// GET /api/v1/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Application>>, AppError> {
    Ok(Json(state.board.applications_for(params.user_id).await))
}

/// PUT /api/v1/applications/:id/status
/// Recruiter review of a single application.
pub async fn handle_set_application_status(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Application>, AppError> {
    let application = state
        .board
        .set_application_status(application_id, req.status)
        .await?;
    Ok(Json(application))
}

/// GET /api/v1/jobs/filters
pub async fn handle_get_filters(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<FilterStateResponse>, AppError> {
    let response = state
        .sessions
        .read(params.user_id, |s| FilterStateResponse::from(&s.jobs))
        .await?;
    Ok(Json(response))
}

/// PUT /api/v1/jobs/filters/:facet
pub async fn handle_set_facet(
    State(state): State<AppState>,
    Path(facet): Path<String>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<FacetValue>,
) -> Result<Json<FilterStateResponse>, AppError> {
    let facet: Facet = facet.parse()?;
    let response = state
        .sessions
        .update(params.user_id, |s| {
            s.jobs.filters.set_facet(facet, &req.value)?;
            Ok(FilterStateResponse::from(&s.jobs))
        })
        .await?;
    Ok(Json(response))
}

/// DELETE /api/v1/jobs/filters
pub async fn handle_clear_filters(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<FilterStateResponse>, AppError> {
    let response = state
        .sessions
        .update(params.user_id, |s| {
            s.jobs.filters.clear_all();
            Ok(FilterStateResponse::from(&s.jobs))
        })
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/jobs/search
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<FilterStateResponse>, AppError> {
    let response = state
        .sessions
        .update(params.user_id, |s| {
            s.jobs.search(&req.query, &req.location);
            Ok(FilterStateResponse::from(&s.jobs))
        })
        .await?;
    Ok(Json(response))
}

/// PUT /api/v1/jobs/page
pub async fn handle_set_page(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<PageRequest>,
) -> Result<Json<FilterStateResponse>, AppError> {
    let response = state
        .sessions
        .update(params.user_id, |s| {
            s.jobs.filters.set_page(req.page);
            Ok(FilterStateResponse::from(&s.jobs))
        })
        .await?;
    Ok(Json(response))
}

/// PUT /api/v1/jobs/sort
pub async fn handle_set_sort(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<SortRequest>,
) -> Result<Json<FilterStateResponse>, AppError> {
    let sort: JobSort = req.sort.parse()?;
    let response = state
        .sessions
        .update(params.user_id, |s| {
            s.jobs.filters.set_sort(sort);
            Ok(FilterStateResponse::from(&s.jobs))
        })
        .await?;
    Ok(Json(response))
}
