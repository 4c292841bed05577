use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::models::genre::{GenreDto, GenreRequest};
use crate::services::access::Identity;
use crate::utils::search::contains_pattern;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use validator::Validate;

pub struct GenreService {
    db: DatabaseConnection,
}

impl GenreService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Genres sorted by name, optionally narrowed to a case-insensitive name match.
    pub async fn list(&self, q: Option<&str>) -> Result<Vec<GenreDto>, AppError> {
        let mut select = Genres::find();
        if let Some(q) = q.map(str::trim).filter(|q| !q.is_empty()) {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col((Genres, genres::Column::Name))))
                    .like(contains_pattern(q)),
            );
        }

        Ok(select
            .order_by_asc(genres::Column::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .map(GenreDto::from)
            .collect())
    }

    pub async fn get(&self, id: i32) -> Result<GenreDto, AppError> {
        Ok(self.find(id).await?.into())
    }

    pub async fn create(&self, req: GenreRequest, identity: &Identity) -> Result<GenreDto, AppError> {
        identity.require_admin("Only administrators can manage genres.")?;
        req.validate()?;

        let name = req.name.trim().to_string();
        self.ensure_name_free(&name, None).await?;

        let genre = genres::ActiveModel {
            name: Set(name.clone()),
            description: Set(req.description),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| AppError::on_write(e, &duplicate_name(&name)))?;

        info!("🏷️  Genre {} '{}' created", genre.id, genre.name);
        Ok(genre.into())
    }

    pub async fn update(
        &self,
        id: i32,
        req: GenreRequest,
        identity: &Identity,
    ) -> Result<GenreDto, AppError> {
        identity.require_admin("Only administrators can manage genres.")?;
        let genre = self.find(id).await?;
        req.validate()?;

        let name = req.name.trim().to_string();
        self.ensure_name_free(&name, Some(id)).await?;

        let mut active: genres::ActiveModel = genre.into();
        active.name = Set(name.clone());
        active.description = Set(req.description);

        Ok(active
            .update(&self.db)
            .await
            .map_err(|e| AppError::on_write(e, &duplicate_name(&name)))?
            .into())
    }

    /// Removes the genre and unlinks it from every movie.
    pub async fn delete(&self, id: i32, identity: &Identity) -> Result<(), AppError> {
        identity.require_admin("Only administrators can manage genres.")?;
        self.find(id).await?;

        let txn = self.db.begin().await?;
        MovieGenres::delete_many()
            .filter(movie_genres::Column::GenreId.eq(id))
            .exec(&txn)
            .await?;
        Genres::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!("🗑️  Genre {} deleted", id);
        Ok(())
    }

    async fn ensure_name_free(&self, name: &str, exclude_id: Option<i32>) -> Result<(), AppError> {
        let mut select = Genres::find().filter(
            Expr::expr(Func::lower(Expr::col((Genres, genres::Column::Name))))
                .eq(Func::lower(Expr::val(name))),
        );
        if let Some(id) = exclude_id {
            select = select.filter(genres::Column::Id.ne(id));
        }

        if select.count(&self.db).await? > 0 {
            return Err(AppError::Conflict(duplicate_name(name)));
        }
        Ok(())
    }

    async fn find(&self, id: i32) -> Result<genres::Model, AppError> {
        Genres::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Genre not found".to_string()))
    }
}

fn duplicate_name(name: &str) -> String {
    format!("Genre '{}' already exists.", name)
}
