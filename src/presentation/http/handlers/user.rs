//! User Handlers

use axum::{extract::State, Json};

use crate::application::dto::UserListItem;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// User directory, oldest account first
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserListItem>>, AppError> {
    Ok(Json(state.users.list_users().await?))
}
