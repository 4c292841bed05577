use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::models::review::{CreateReviewRequest, ReviewDto, ReviewListQuery, UpdateReviewRequest};
use crate::services::access::Identity;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use tracing::info;
use validator::Validate;

const DUPLICATE_REVIEW: &str = "User has already reviewed this movie.";

pub struct ReviewService {
    db: DatabaseConnection,
}

impl ReviewService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Admins may filter by any user. Everyone else is restricted to their own reviews,
    /// and anonymous callers get an empty list unless they name a user.
    pub async fn list(
        &self,
        query: &ReviewListQuery,
        identity: &Identity,
    ) -> Result<Vec<ReviewDto>, AppError> {
        let mut select = Reviews::find();

        if let Some(movie_id) = query.movie_id {
            select = select.filter(reviews::Column::MovieId.eq(movie_id));
        }

        if identity.is_admin() {
            if let Some(user_id) = query.user_id {
                select = select.filter(reviews::Column::UserId.eq(user_id));
            }
        } else {
            let Some(caller) = identity.current_user_id() else {
                if query.user_id.is_some() {
                    return Err(AppError::Forbidden(
                        "You can only list your own reviews.".to_string(),
                    ));
                }
                return Ok(Vec::new());
            };
            if query.user_id.is_some_and(|requested| requested != caller) {
                return Err(AppError::Forbidden(
                    "You can only list your own reviews.".to_string(),
                ));
            }
            select = select.filter(reviews::Column::UserId.eq(caller));
        }

        self.fetch(select).await
    }

    pub async fn list_mine(&self, identity: &Identity) -> Result<Vec<ReviewDto>, AppError> {
        let user_id = identity.require_user_id()?;
        self.fetch(Reviews::find().filter(reviews::Column::UserId.eq(user_id)))
            .await
    }

    pub async fn get(&self, id: i32, identity: &Identity) -> Result<ReviewDto, AppError> {
        let review = self.find(id).await?;
        identity.require_can_modify(review.user_id, "You can only view your own reviews.")?;
        Ok(review.into())
    }

    pub async fn create(
        &self,
        req: CreateReviewRequest,
        identity: &Identity,
    ) -> Result<ReviewDto, AppError> {
        let caller = identity.require_user_id()?;
        req.validate()?;

        let author = req.user_id.unwrap_or(caller);
        if author != caller && !identity.is_admin() {
            return Err(AppError::Forbidden(
                "You can only create reviews as yourself.".to_string(),
            ));
        }

        if Movies::find_by_id(req.movie_id).one(&self.db).await?.is_none() {
            return Err(AppError::Validation("Movie does not exist.".to_string()));
        }
        if Users::find_by_id(author).one(&self.db).await?.is_none() {
            return Err(AppError::Validation("User does not exist.".to_string()));
        }

        let existing = Reviews::find()
            .filter(reviews::Column::UserId.eq(author))
            .filter(reviews::Column::MovieId.eq(req.movie_id))
            .count(&self.db)
            .await?;
        if existing > 0 {
            return Err(AppError::Conflict(DUPLICATE_REVIEW.to_string()));
        }

        let review = reviews::ActiveModel {
            movie_id: Set(req.movie_id),
            user_id: Set(author),
            score: Set(req.score),
            title: Set(clean_optional(req.title)),
            body: Set(clean_optional(req.body)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| AppError::on_write(e, DUPLICATE_REVIEW))?;

        info!(
            "⭐ Review {} created for movie {} by user {} (score {})",
            review.id, review.movie_id, review.user_id, review.score
        );

        Ok(review.into())
    }

    pub async fn update(
        &self,
        id: i32,
        req: UpdateReviewRequest,
        identity: &Identity,
    ) -> Result<ReviewDto, AppError> {
        identity.require_user_id()?;
        let review = self.find(id).await?;
        identity.require_can_modify(review.user_id, "You can only edit your own reviews.")?;
        req.validate()?;

        let mut active: reviews::ActiveModel = review.into();
        active.score = Set(req.score);
        active.title = Set(clean_optional(req.title));
        active.body = Set(clean_optional(req.body));

        Ok(active.update(&self.db).await?.into())
    }

    pub async fn delete(&self, id: i32, identity: &Identity) -> Result<(), AppError> {
        identity.require_user_id()?;
        let review = self.find(id).await?;
        identity.require_can_modify(review.user_id, "You can only delete your own reviews.")?;

        Reviews::delete_by_id(id).exec(&self.db).await?;
        info!("🗑️  Review {} deleted", id);
        Ok(())
    }

    async fn fetch(&self, select: Select<Reviews>) -> Result<Vec<ReviewDto>, AppError> {
        Ok(select
            .order_by_desc(reviews::Column::CreatedAt)
            .order_by_desc(reviews::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(ReviewDto::from)
            .collect())
    }

    async fn find(&self, id: i32) -> Result<reviews::Model, AppError> {
        Reviews::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".to_string()))
    }
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
