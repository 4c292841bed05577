use crate::entities::reviews;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListQuery {
    pub movie_id: Option<i32>,
    pub user_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: i32,
    pub movie_id: i32,
    pub user_id: i32,
    pub score: i32,
    pub title: Option<String>,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<reviews::Model> for ReviewDto {
    fn from(r: reviews::Model) -> Self {
        Self {
            id: r.id,
            movie_id: r.movie_id,
            user_id: r.user_id,
            score: r.score,
            title: r.title,
            body: r.body,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub movie_id: i32,
    /// Defaults to the caller; only admins may name another user.
    pub user_id: Option<i32>,
    #[validate(range(min = 1, max = 10))]
    pub score: i32,
    #[validate(length(max = 120))]
    pub title: Option<String>,
    #[validate(length(max = 4000))]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    #[validate(range(min = 1, max = 10))]
    pub score: i32,
    #[validate(length(max = 120))]
    pub title: Option<String>,
    #[validate(length(max = 4000))]
    pub body: Option<String>,
}
