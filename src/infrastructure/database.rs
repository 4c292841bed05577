use crate::entities::{genres, movie_genres, movies, refresh_tokens, reviews, users};
use crate::services::user_service::DELETED_USER_ID;
use anyhow::Context;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema, Statement};
use std::env;
use std::time::Duration;
use tracing::info;

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    // Order matters for foreign keys: users and genres before anything referencing them.
    let stmts = vec![
        (
            "users",
            schema
                .create_table_from_entity(users::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "genres",
            schema
                .create_table_from_entity(genres::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "movies",
            schema
                .create_table_from_entity(movies::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "movie_genres",
            schema
                .create_table_from_entity(movie_genres::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "reviews",
            schema
                .create_table_from_entity(reviews::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "refresh_tokens",
            schema
                .create_table_from_entity(refresh_tokens::Entity)
                .if_not_exists()
                .to_owned(),
        ),
    ];

    for (name, stmt) in stmts {
        db.execute(builder.build(&stmt))
            .await
            .with_context(|| format!("failed to create table '{}'", name))?;
        info!("   - Table '{}' checked/created", name);
    }

    // Composite uniqueness. The system account is exempt from one-review-per-movie
    // because it inherits reviews from every deleted user.
    let indexes = vec![
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_movies_title_year ON movies(title, release_year)"
            .to_string(),
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_reviews_user_movie ON reviews(user_id, movie_id) WHERE user_id <> {}",
            DELETED_USER_ID
        ),
        "CREATE INDEX IF NOT EXISTS idx_movies_status ON movies(status)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_reviews_movie_id ON reviews(movie_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_movie_genres_genre_id ON movie_genres(genre_id)"
            .to_string(),
    ];

    for query in indexes {
        db.execute(Statement::from_string(builder, query.clone()))
            .await
            .with_context(|| format!("failed to apply schema update: {}", query))?;
        tracing::debug!("   - Executed schema update: {}", query);
    }

    Ok(())
}
