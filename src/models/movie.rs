use crate::entities::movies::MovieStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MovieListQuery {
    pub genre_id: Option<i32>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieListItem {
    pub id: i32,
    pub title: String,
    pub release_year: i32,
    pub duration_min: i32,
    pub status: MovieStatus,
    pub uploaded_by_user_id: i32,
    /// Genre names, sorted.
    pub genres: Vec<String>,
    pub average_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub release_year: i32,
    pub duration_min: i32,
    pub status: MovieStatus,
    pub uploaded_by_user_id: i32,
    pub genre_ids: Vec<i32>,
    pub average_score: f64,
    pub created_at: DateTime<Utc>,
}

/// Body for both create and update; update replaces every field and the genre set.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MovieRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 1888, max = 2100))]
    pub release_year: i32,
    #[validate(range(min = 1, max = 600))]
    pub duration_min: i32,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MovieReviewsQuery {
    #[serde(default)]
    pub include_text: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieReviewItem {
    pub id: i32,
    pub user_id: i32,
    pub score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieReviews {
    pub movie_id: i32,
    pub reviews: Vec<MovieReviewItem>,
}
