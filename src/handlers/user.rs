use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::Result,
    models::user::{NewUser, UserDto, UserUpdate},
    state::AppState,
};

/// Get all users handler
pub async fn get_all_users(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let users = state.users.get_all_users().await?;
    let user_dtos: Vec<UserDto> = users.into_iter().map(UserDto::from).collect();
    Ok((StatusCode::OK, Json(user_dtos)))
}

/// Create user handler
pub async fn create_user(
    State(state): State<AppState>,
    Json(new_user): Json<NewUser>,
) -> Result<impl IntoResponse> {
    let user = state.users.create_user(&new_user).await?;
    tracing::info!("User {} created", user.id);
    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// Update user handler
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<UserUpdate>,
) -> Result<impl IntoResponse> {
    let user = state.users.update_user(id, &update).await?;
    Ok((StatusCode::OK, Json(UserDto::from(user))))
}

/// Delete user handler
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.users.delete_user(id).await?;
    tracing::info!("User {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}
