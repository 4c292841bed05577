#![allow(dead_code)]

use chrono::Utc;
use movie_review_backend::config::AppConfig;
use movie_review_backend::entities::movies::MovieStatus;
use movie_review_backend::entities::users::UserRole;
use movie_review_backend::entities::{genres, movie_genres, movies, reviews, users};
use movie_review_backend::infrastructure::{database, seed};
use movie_review_backend::services::access::Identity;
use movie_review_backend::utils::password::hash_password;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};

/// Schema only, no system account. A single pooled connection keeps the in-memory database alive.
pub async fn setup_empty_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

pub async fn setup_test_db() -> DatabaseConnection {
    let db = setup_empty_db().await;
    seed::ensure_deleted_user(&db).await.unwrap();
    db
}

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: "test-secret".to_string(),
        ..AppConfig::default()
    }
}

pub fn identity_of(user: &users::Model) -> Identity {
    Identity::with_role(user.id, user.role)
}

pub async fn create_user(db: &DatabaseConnection, username: &str, role: UserRole) -> users::Model {
    users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        password_hash: Set(None),
        role: Set(role),
        is_system: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_user_with_password(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    role: UserRole,
) -> users::Model {
    users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        password_hash: Set(Some(hash_password(password).unwrap())),
        role: Set(role),
        is_system: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_genre(db: &DatabaseConnection, name: &str) -> genres::Model {
    genres::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Inserts a movie directly, bypassing moderation rules.
pub async fn insert_movie(
    db: &DatabaseConnection,
    title: &str,
    year: i32,
    status: MovieStatus,
    uploader_id: i32,
    genre_ids: &[i32],
) -> movies::Model {
    let movie = movies::ActiveModel {
        title: Set(title.to_string()),
        description: Set(None),
        release_year: Set(year),
        duration_min: Set(100),
        status: Set(status),
        uploaded_by_user_id: Set(uploader_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    for genre_id in genre_ids {
        movie_genres::Entity::insert(movie_genres::ActiveModel {
            movie_id: Set(movie.id),
            genre_id: Set(*genre_id),
        })
        .exec_without_returning(db)
        .await
        .unwrap();
    }

    movie
}

pub async fn insert_review(
    db: &DatabaseConnection,
    movie_id: i32,
    user_id: i32,
    score: i32,
) -> reviews::Model {
    reviews::ActiveModel {
        movie_id: Set(movie_id),
        user_id: Set(user_id),
        score: Set(score),
        title: Set(Some("Review".to_string())),
        body: Set(Some("Body".to_string())),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}
