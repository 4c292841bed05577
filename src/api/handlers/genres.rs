use crate::AppState;
use crate::api::error::AppError;
use crate::models::genre::{GenreDto, GenreListQuery, GenreRequest};
use crate::services::access::Identity;
use crate::api::extract::{Json, Path, Query};
use axum::{Extension, extract::State, http::StatusCode};

pub async fn list_genres(
    State(state): State<AppState>,
    Query(query): Query<GenreListQuery>,
) -> Result<Json<Vec<GenreDto>>, AppError> {
    Ok(Json(state.genres.list(query.q.as_deref()).await?))
}

pub async fn get_genre(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GenreDto>, AppError> {
    Ok(Json(state.genres.get(id).await?))
}

pub async fn create_genre(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<GenreRequest>,
) -> Result<(StatusCode, Json<GenreDto>), AppError> {
    let genre = state.genres.create(payload, &identity).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

pub async fn update_genre(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
    Json(payload): Json<GenreRequest>,
) -> Result<Json<GenreDto>, AppError> {
    Ok(Json(state.genres.update(id, payload, &identity).await?))
}

pub async fn delete_genre(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.genres.delete(id, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}
