use crate::AppState;
use crate::api::error::AppError;
use crate::models::movie::MovieListItem;
use crate::models::review::ReviewDto;
use crate::models::user::{CreateUserRequest, UpdateUserRequest, UserDto, UserListQuery};
use crate::services::access::Identity;
use crate::api::extract::{Json, Path, Query};
use axum::{Extension, extract::State, http::StatusCode};

pub async fn list_users(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserDto>>, AppError> {
    Ok(Json(state.users.list(&query, &identity).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<Json<UserDto>, AppError> {
    Ok(Json(state.users.get(id, &identity).await?))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UserDto>, AppError> {
    Ok(Json(state.users.me(&identity).await?))
}

pub async fn my_movies(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<MovieListItem>>, AppError> {
    Ok(Json(state.movies.list_uploaded_by_caller(&identity).await?))
}

pub async fn my_reviews(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<ReviewDto>>, AppError> {
    Ok(Json(state.reviews.list_mine(&identity).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), AppError> {
    let user = state.users.create(payload, &identity).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserDto>, AppError> {
    Ok(Json(state.users.update(id, payload, &identity).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.users.delete(id, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}
