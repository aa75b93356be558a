pub mod health;
pub mod session;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::jobs::handlers as jobs;
use crate::resume::handlers as resumes;
use crate::state::AppState;

/// Identifies the caller; authentication happens upstream.
#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume builder
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list_resumes).post(resumes::handle_create_resume),
        )
        .route("/api/v1/resumes/current", get(resumes::handle_get_current))
        .route(
            "/api/v1/resumes/current/completion",
            get(resumes::handle_completion),
        )
        .route("/api/v1/resumes/current/save", post(resumes::handle_save))
        .route(
            "/api/v1/resumes/current/fields/:field",
            put(resumes::handle_set_field),
        )
        .route(
            "/api/v1/resumes/current/fields/:field/:nested",
            put(resumes::handle_set_nested_field),
        )
        .route(
            "/api/v1/resumes/current/sections/:section",
            post(resumes::handle_add_item),
        )
        .route(
            "/api/v1/resumes/current/sections/:section/:item_id",
            patch(resumes::handle_update_item).delete(resumes::handle_remove_item),
        )
        .route(
            "/api/v1/resumes/current/skills/:category",
            post(resumes::handle_add_skill),
        )
        .route(
            "/api/v1/resumes/current/skills/:category/:index",
            delete(resumes::handle_remove_skill),
        )
        .route(
            "/api/v1/resumes/current/template",
            put(resumes::handle_change_template),
        )
        .route(
            "/api/v1/resumes/current/import",
            post(resumes::handle_import_profile),
        )
        .route("/api/v1/resumes/:id", delete(resumes::handle_delete))
        .route("/api/v1/resumes/:id/load", post(resumes::handle_load))
        // Job search
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_post_job),
        )
        .route(
            "/api/v1/jobs/filters",
            get(jobs::handle_get_filters).delete(jobs::handle_clear_filters),
        )
        .route("/api/v1/jobs/filters/:facet", put(jobs::handle_set_facet))
        .route("/api/v1/jobs/search", post(jobs::handle_search))
        .route("/api/v1/jobs/page", put(jobs::handle_set_page))
        .route("/api/v1/jobs/sort", put(jobs::handle_set_sort))
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job).delete(jobs::handle_remove_job),
        )
        .route("/api/v1/jobs/:id/apply", post(jobs::handle_apply))
        .route("/api/v1/jobs/:id/save", post(jobs::handle_toggle_saved))
        .route("/api/v1/applications", get(jobs::handle_list_applications))
        .route(
            "/api/v1/applications/:id/status",
            put(jobs::handle_set_application_status),
        )
        .route("/api/v1/session", delete(session::handle_logout))
        .with_state(state)
}
