use crate::AppState;
use crate::api::error::AppError;
use crate::models::movie::{
    MovieDetails, MovieListItem, MovieListQuery, MovieRequest, MovieReviews, MovieReviewsQuery,
};
use crate::services::access::Identity;
use crate::api::extract::{Json, Path, Query};
use axum::{Extension, extract::State, http::StatusCode};

pub async fn list_movies(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<MovieListQuery>,
) -> Result<Json<Vec<MovieListItem>>, AppError> {
    Ok(Json(state.movies.list(&query, &identity).await?))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<Json<MovieDetails>, AppError> {
    Ok(Json(state.movies.get(id, &identity).await?))
}

pub async fn create_movie(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<MovieRequest>,
) -> Result<(StatusCode, Json<MovieDetails>), AppError> {
    let movie = state.movies.create(payload, &identity).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn update_movie(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
    Json(payload): Json<MovieRequest>,
) -> Result<Json<MovieDetails>, AppError> {
    Ok(Json(state.movies.update(id, payload, &identity).await?))
}

pub async fn delete_movie(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.movies.delete(id, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn approve_movie(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<Json<MovieDetails>, AppError> {
    Ok(Json(state.movies.approve(id, &identity).await?))
}

pub async fn reject_movie(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<Json<MovieDetails>, AppError> {
    Ok(Json(state.movies.reject(id, &identity).await?))
}

pub async fn movie_reviews(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
    Query(query): Query<MovieReviewsQuery>,
) -> Result<Json<MovieReviews>, AppError> {
    Ok(Json(
        state
            .movies
            .reviews(id, query.include_text, &identity)
            .await?,
    ))
}
