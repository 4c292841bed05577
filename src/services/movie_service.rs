use crate::api::error::AppError;
use crate::entities::movies::MovieStatus;
use crate::entities::{prelude::*, *};
use crate::models::movie::{
    MovieDetails, MovieListItem, MovieListQuery, MovieRequest, MovieReviewItem, MovieReviews,
};
use crate::services::access::Identity;
use crate::utils::search::contains_pattern;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};
use validator::Validate;

/// Status a new listing starts in: admins publish directly, everyone else waits for moderation.
pub fn initial_status(created_by_admin: bool) -> MovieStatus {
    if created_by_admin {
        MovieStatus::Approved
    } else {
        MovieStatus::Pending
    }
}

/// Status after a content edit. Any edit by a non-admin re-enters moderation.
pub fn status_after_edit(current: MovieStatus, edited_by_admin: bool) -> MovieStatus {
    if edited_by_admin {
        current
    } else {
        MovieStatus::Pending
    }
}

/// Approved listings are public; anything else only to admins and the uploader.
pub fn can_view(identity: &Identity, movie: &movies::Model) -> bool {
    movie.status == MovieStatus::Approved || identity.can_modify(movie.uploaded_by_user_id)
}

/// Arithmetic mean of the scores, 0 when there are none.
pub fn average_score(scores: &[i32]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64
}

pub struct MovieService {
    db: DatabaseConnection,
}

impl MovieService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists movies newest first. Non-admins only ever see approved movies.
    pub async fn list(
        &self,
        query: &MovieListQuery,
        identity: &Identity,
    ) -> Result<Vec<MovieListItem>, AppError> {
        let mut select = Movies::find();

        if !identity.is_admin() {
            select = select.filter(movies::Column::Status.eq(MovieStatus::Approved));
        }

        if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col((Movies, movies::Column::Title))))
                    .like(contains_pattern(q)),
            );
        }

        if let Some(genre_id) = query.genre_id {
            select = select.filter(
                movies::Column::Id.in_subquery(
                    Query::select()
                        .column(movie_genres::Column::MovieId)
                        .from(MovieGenres)
                        .and_where(movie_genres::Column::GenreId.eq(genre_id))
                        .to_owned(),
                ),
            );
        }

        let rows = select
            .order_by_desc(movies::Column::CreatedAt)
            .order_by_desc(movies::Column::Id)
            .all(&self.db)
            .await?;

        Ok(list_items(&self.db, rows).await?)
    }

    /// Every movie the caller uploaded, whatever its status.
    pub async fn list_uploaded_by_caller(
        &self,
        identity: &Identity,
    ) -> Result<Vec<MovieListItem>, AppError> {
        let user_id = identity.require_user_id()?;

        let rows = Movies::find()
            .filter(movies::Column::UploadedByUserId.eq(user_id))
            .order_by_desc(movies::Column::CreatedAt)
            .order_by_desc(movies::Column::Id)
            .all(&self.db)
            .await?;

        Ok(list_items(&self.db, rows).await?)
    }

    pub async fn get(&self, id: i32, identity: &Identity) -> Result<MovieDetails, AppError> {
        let movie = self.find(id).await?;
        ensure_visible(identity, &movie)?;
        Ok(details(&self.db, movie).await?)
    }

    pub async fn create(
        &self,
        req: MovieRequest,
        identity: &Identity,
    ) -> Result<MovieDetails, AppError> {
        let uploader_id = identity.require_user_id()?;
        req.validate()?;

        let title = clean_title(&req.title)?;
        let genre_ids = dedup_ids(&req.genre_ids);

        ensure_genres_exist(&self.db, &genre_ids).await?;
        ensure_title_year_free(&self.db, &title, req.release_year, None).await?;

        let status = initial_status(identity.is_admin());
        let conflict = title_year_conflict(&title, req.release_year);

        let txn = self.db.begin().await?;

        let movie = movies::ActiveModel {
            title: Set(title),
            description: Set(clean_optional(req.description)),
            release_year: Set(req.release_year),
            duration_min: Set(req.duration_min),
            status: Set(status),
            uploaded_by_user_id: Set(uploader_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::on_write(e, &conflict))?;

        replace_genres(&txn, movie.id, &genre_ids).await?;

        txn.commit().await?;

        info!(
            "🎬 Movie {} '{}' created by user {} with status {:?}",
            movie.id, movie.title, uploader_id, movie.status
        );

        Ok(details(&self.db, movie).await?)
    }

    pub async fn update(
        &self,
        id: i32,
        req: MovieRequest,
        identity: &Identity,
    ) -> Result<MovieDetails, AppError> {
        identity.require_user_id()?;
        let movie = self.find(id).await?;
        identity.require_can_modify(
            movie.uploaded_by_user_id,
            "You don't have permission to update this movie.",
        )?;
        req.validate()?;

        let title = clean_title(&req.title)?;
        let genre_ids = dedup_ids(&req.genre_ids);

        ensure_genres_exist(&self.db, &genre_ids).await?;
        ensure_title_year_free(&self.db, &title, req.release_year, Some(id)).await?;

        let previous_status = movie.status;
        let status = status_after_edit(previous_status, identity.is_admin());
        let conflict = title_year_conflict(&title, req.release_year);

        let txn = self.db.begin().await?;

        let mut active: movies::ActiveModel = movie.into();
        active.title = Set(title);
        active.description = Set(clean_optional(req.description));
        active.release_year = Set(req.release_year);
        active.duration_min = Set(req.duration_min);
        active.status = Set(status);

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AppError::on_write(e, &conflict))?;

        replace_genres(&txn, id, &genre_ids).await?;

        txn.commit().await?;

        if previous_status != status {
            info!(
                "🔁 Movie {} moved from {:?} back to {:?} after edit",
                id, previous_status, status
            );
        }

        Ok(details(&self.db, updated).await?)
    }

    /// Deletes the movie together with its reviews and genre links.
    pub async fn delete(&self, id: i32, identity: &Identity) -> Result<(), AppError> {
        identity.require_user_id()?;
        let movie = self.find(id).await?;
        identity.require_can_modify(
            movie.uploaded_by_user_id,
            "You don't have permission to delete this movie.",
        )?;

        let txn = self.db.begin().await?;

        let removed_reviews = Reviews::delete_many()
            .filter(reviews::Column::MovieId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;

        MovieGenres::delete_many()
            .filter(movie_genres::Column::MovieId.eq(id))
            .exec(&txn)
            .await?;

        Movies::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        info!(
            "🗑️  Movie {} deleted along with {} review(s)",
            id, removed_reviews
        );
        Ok(())
    }

    pub async fn approve(&self, id: i32, identity: &Identity) -> Result<MovieDetails, AppError> {
        identity.require_admin("Only administrators can approve movies.")?;
        self.set_status(id, MovieStatus::Approved).await
    }

    pub async fn reject(&self, id: i32, identity: &Identity) -> Result<MovieDetails, AppError> {
        identity.require_admin("Only administrators can reject movies.")?;
        self.set_status(id, MovieStatus::Rejected).await
    }

    /// Reviews of one movie, newest first. Text fields are only filled when asked for.
    pub async fn reviews(
        &self,
        id: i32,
        include_text: bool,
        identity: &Identity,
    ) -> Result<MovieReviews, AppError> {
        let movie = self.find(id).await?;
        ensure_visible(identity, &movie)?;

        let reviews = Reviews::find()
            .filter(reviews::Column::MovieId.eq(id))
            .order_by_desc(reviews::Column::CreatedAt)
            .order_by_desc(reviews::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|r| MovieReviewItem {
                id: r.id,
                user_id: r.user_id,
                score: r.score,
                title: if include_text { r.title } else { None },
                body: if include_text { r.body } else { None },
                created_at: r.created_at,
            })
            .collect();

        Ok(MovieReviews {
            movie_id: id,
            reviews,
        })
    }

    async fn set_status(&self, id: i32, status: MovieStatus) -> Result<MovieDetails, AppError> {
        let movie = self.find(id).await?;
        let previous = movie.status;

        let mut active: movies::ActiveModel = movie.into();
        active.status = Set(status);
        let updated = active.update(&self.db).await?;

        info!("🛡️  Movie {} moderated: {:?} -> {:?}", id, previous, status);

        Ok(details(&self.db, updated).await?)
    }

    async fn find(&self, id: i32) -> Result<movies::Model, AppError> {
        Movies::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))
    }
}

fn ensure_visible(identity: &Identity, movie: &movies::Model) -> Result<(), AppError> {
    if can_view(identity, movie) {
        Ok(())
    } else {
        warn!(
            "Refused access to {:?} movie {} for user {:?}",
            movie.status,
            movie.id,
            identity.current_user_id()
        );
        Err(AppError::Forbidden(
            "You don't have permission to view this movie.".to_string(),
        ))
    }
}

fn clean_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    Ok(title.to_string())
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn dedup_ids(ids: &[i32]) -> Vec<i32> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

fn title_year_conflict(title: &str, year: i32) -> String {
    format!("Movie '{}' ({}) already exists.", title, year)
}

async fn ensure_genres_exist<C: ConnectionTrait>(conn: &C, ids: &[i32]) -> Result<(), AppError> {
    if ids.is_empty() {
        return Ok(());
    }

    let found = Genres::find()
        .filter(genres::Column::Id.is_in(ids.iter().copied()))
        .count(conn)
        .await?;

    if found as usize != ids.len() {
        return Err(AppError::Validation(
            "One or more genres do not exist.".to_string(),
        ));
    }
    Ok(())
}

async fn ensure_title_year_free<C: ConnectionTrait>(
    conn: &C,
    title: &str,
    year: i32,
    exclude_id: Option<i32>,
) -> Result<(), AppError> {
    let mut select = Movies::find()
        .filter(
            Expr::expr(Func::lower(Expr::col((Movies, movies::Column::Title))))
                .eq(Func::lower(Expr::val(title))),
        )
        .filter(movies::Column::ReleaseYear.eq(year));

    if let Some(id) = exclude_id {
        select = select.filter(movies::Column::Id.ne(id));
    }

    if select.count(conn).await? > 0 {
        return Err(AppError::Conflict(title_year_conflict(title, year)));
    }
    Ok(())
}

async fn replace_genres<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
    genre_ids: &[i32],
) -> Result<(), DbErr> {
    MovieGenres::delete_many()
        .filter(movie_genres::Column::MovieId.eq(movie_id))
        .exec(conn)
        .await?;

    if genre_ids.is_empty() {
        return Ok(());
    }

    let links = genre_ids.iter().map(|&genre_id| movie_genres::ActiveModel {
        movie_id: Set(movie_id),
        genre_id: Set(genre_id),
    });

    MovieGenres::insert_many(links)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

async fn scores_by_movie<C: ConnectionTrait>(
    conn: &C,
    movie_ids: &[i32],
) -> Result<HashMap<i32, Vec<i32>>, DbErr> {
    let mut scores: HashMap<i32, Vec<i32>> = HashMap::new();
    if movie_ids.is_empty() {
        return Ok(scores);
    }

    let rows: Vec<(i32, i32)> = Reviews::find()
        .select_only()
        .column(reviews::Column::MovieId)
        .column(reviews::Column::Score)
        .filter(reviews::Column::MovieId.is_in(movie_ids.iter().copied()))
        .into_tuple()
        .all(conn)
        .await?;

    for (movie_id, score) in rows {
        scores.entry(movie_id).or_default().push(score);
    }
    Ok(scores)
}

async fn genre_names_by_movie<C: ConnectionTrait>(
    conn: &C,
    movie_ids: &[i32],
) -> Result<HashMap<i32, Vec<String>>, DbErr> {
    let mut names: HashMap<i32, Vec<String>> = HashMap::new();
    if movie_ids.is_empty() {
        return Ok(names);
    }

    let links = MovieGenres::find()
        .filter(movie_genres::Column::MovieId.is_in(movie_ids.iter().copied()))
        .all(conn)
        .await?;

    let genre_ids: BTreeSet<i32> = links.iter().map(|l| l.genre_id).collect();
    let genre_names: HashMap<i32, String> = Genres::find()
        .filter(genres::Column::Id.is_in(genre_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|g| (g.id, g.name))
        .collect();

    for link in links {
        if let Some(name) = genre_names.get(&link.genre_id) {
            names.entry(link.movie_id).or_default().push(name.clone());
        }
    }
    for list in names.values_mut() {
        list.sort();
    }
    Ok(names)
}

async fn list_items<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<movies::Model>,
) -> Result<Vec<MovieListItem>, DbErr> {
    let ids: Vec<i32> = rows.iter().map(|m| m.id).collect();
    let mut genres = genre_names_by_movie(conn, &ids).await?;
    let scores = scores_by_movie(conn, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|m| MovieListItem {
            genres: genres.remove(&m.id).unwrap_or_default(),
            average_score: scores
                .get(&m.id)
                .map(|s| average_score(s))
                .unwrap_or(0.0),
            id: m.id,
            title: m.title,
            release_year: m.release_year,
            duration_min: m.duration_min,
            status: m.status,
            uploaded_by_user_id: m.uploaded_by_user_id,
        })
        .collect())
}

async fn details<C: ConnectionTrait>(conn: &C, movie: movies::Model) -> Result<MovieDetails, DbErr> {
    let genre_ids: Vec<i32> = MovieGenres::find()
        .filter(movie_genres::Column::MovieId.eq(movie.id))
        .order_by_asc(movie_genres::Column::GenreId)
        .all(conn)
        .await?
        .into_iter()
        .map(|l| l.genre_id)
        .collect();

    let scores = scores_by_movie(conn, &[movie.id]).await?;
    let average = scores
        .get(&movie.id)
        .map(|s| average_score(s))
        .unwrap_or(0.0);

    Ok(MovieDetails {
        id: movie.id,
        title: movie.title,
        description: movie.description,
        release_year: movie.release_year,
        duration_min: movie.duration_min,
        status: movie.status,
        uploaded_by_user_id: movie.uploaded_by_user_id,
        genre_ids,
        average_score: average,
        created_at: movie.created_at,
    })
}
