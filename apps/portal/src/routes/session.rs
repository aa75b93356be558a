use axum::{
    extract::{Query, State},
    http::StatusCode,
};

use crate::errors::AppError;
use crate::routes::UserIdQuery;
use crate::state::AppState;

/// DELETE /api/v1/session
/// Logout: drops the user's in-memory session and both stored slices.
pub async fn handle_logout(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    state.sessions.clear(params.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
