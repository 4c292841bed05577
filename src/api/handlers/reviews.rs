use crate::AppState;
use crate::api::error::AppError;
use crate::models::review::{CreateReviewRequest, ReviewDto, ReviewListQuery, UpdateReviewRequest};
use crate::services::access::Identity;
use crate::api::extract::{Json, Path, Query};
use axum::{Extension, extract::State, http::StatusCode};

pub async fn list_reviews(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ReviewListQuery>,
) -> Result<Json<Vec<ReviewDto>>, AppError> {
    Ok(Json(state.reviews.list(&query, &identity).await?))
}

pub async fn get_review(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<Json<ReviewDto>, AppError> {
    Ok(Json(state.reviews.get(id, &identity).await?))
}

pub async fn create_review(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewDto>), AppError> {
    let review = state.reviews.create(payload, &identity).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn update_review(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<Json<ReviewDto>, AppError> {
    Ok(Json(state.reviews.update(id, payload, &identity).await?))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.reviews.delete(id, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}
