use crate::config::AppConfig;
use crate::entities::movies::MovieStatus;
use crate::entities::users::UserRole;
use crate::entities::{prelude::*, *};
use crate::services::user_service::{DELETED_EMAIL, DELETED_USER_ID, DELETED_USERNAME};
use crate::utils::password::hash_password;
use chrono::Utc;
use sea_orm::sea_query::Condition;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    EntityTrait, QueryFilter, Set, Statement,
};
use tracing::{info, warn};

/// Idempotent startup seeding: system account, optional bootstrap admin, optional demo data.
pub async fn seed_initial_data(db: &DatabaseConnection, config: &AppConfig) -> anyhow::Result<()> {
    ensure_deleted_user(db).await?;

    if let Some((username, email, password)) = config.bootstrap_admin() {
        ensure_admin(db, username, email, password).await?;
    }

    if config.seed_demo_data {
        seed_demo_data(db).await?;
    }

    Ok(())
}

/// Makes sure the system account that absorbs deleted users' content exists at its fixed id.
pub async fn ensure_deleted_user(db: &DatabaseConnection) -> anyhow::Result<()> {
    if Users::find_by_id(DELETED_USER_ID).one(db).await?.is_some() {
        return Ok(());
    }

    users::ActiveModel {
        id: Set(DELETED_USER_ID),
        username: Set(DELETED_USERNAME.to_string()),
        email: Set(DELETED_EMAIL.to_string()),
        password_hash: Set(None),
        role: Set(UserRole::User),
        is_system: Set(true),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    // An explicit id does not advance the serial sequence on PostgreSQL.
    if db.get_database_backend() == DatabaseBackend::Postgres {
        db.execute(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT setval(pg_get_serial_sequence('users', 'id'), (SELECT MAX(id) FROM users))"
                .to_string(),
        ))
        .await?;
    }

    info!("🌱 Seeded system user '{}' (id {})", DELETED_USERNAME, DELETED_USER_ID);
    Ok(())
}

/// Creates an admin account, or promotes the matching existing account to admin.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<users::Model> {
    let existing = Users::find()
        .filter(
            Condition::any()
                .add(users::Column::Username.eq(username))
                .add(users::Column::Email.eq(email)),
        )
        .one(db)
        .await?;

    match existing {
        Some(user) if user.is_system => {
            anyhow::bail!("refusing to promote the system user '{}'", user.username)
        }
        Some(user) if user.role == UserRole::Admin => Ok(user),
        Some(user) => {
            let id = user.id;
            let mut active: users::ActiveModel = user.into();
            active.role = Set(UserRole::Admin);
            let promoted = active.update(db).await?;
            info!("🛡️  Promoted user {} '{}' to Admin", id, promoted.username);
            Ok(promoted)
        }
        None => {
            let admin = users::ActiveModel {
                username: Set(username.to_string()),
                email: Set(email.to_string()),
                password_hash: Set(Some(hash_password(password)?)),
                role: Set(UserRole::Admin),
                is_system: Set(false),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?;
            info!("🛡️  Created admin user {} '{}'", admin.id, admin.username);
            Ok(admin)
        }
    }
}

const DEMO_GENRES: &[(&str, &str)] = &[
    ("Action", "High energy, fights, chases, and explosions."),
    ("Comedy", "Humorous and entertaining."),
    ("Drama", "Emotional themes and character development."),
    ("Sci-Fi", "Futuristic or advanced technology."),
    ("Fantasy", "Magic and imaginary worlds."),
    ("Horror", "Frightening, suspenseful, supernatural."),
    ("Romance", "Love stories."),
    ("Thriller", "Suspenseful plots and twists."),
    ("Documentary", "Non-fictional storytelling."),
    ("Animation", "Animated works."),
];

const DEMO_USERS: &[&str] = &["alice", "bob", "charlie", "diana"];

struct DemoMovie {
    title: &'static str,
    description: &'static str,
    year: i32,
    duration: i32,
    uploader: &'static str,
    genres: &'static [&'static str],
}

const DEMO_MOVIES: &[DemoMovie] = &[
    DemoMovie {
        title: "Inception",
        description: "A thief enters dreams to steal secrets, but aims to plant an idea.",
        year: 2010,
        duration: 148,
        uploader: "alice",
        genres: &["Sci-Fi", "Thriller"],
    },
    DemoMovie {
        title: "Interstellar",
        description: "Explorers travel through a wormhole to save humanity.",
        year: 2014,
        duration: 169,
        uploader: "alice",
        genres: &["Sci-Fi", "Drama"],
    },
    DemoMovie {
        title: "The Dark Knight",
        description: "Batman faces Joker in Gotham.",
        year: 2008,
        duration: 152,
        uploader: "bob",
        genres: &["Action", "Thriller"],
    },
    DemoMovie {
        title: "Titanic",
        description: "A romance unfolds on the doomed ship.",
        year: 1997,
        duration: 195,
        uploader: "charlie",
        genres: &["Drama", "Romance"],
    },
    DemoMovie {
        title: "Spirited Away",
        description: "A girl enters a magical spirit world.",
        year: 2001,
        duration: 125,
        uploader: "diana",
        genres: &["Fantasy", "Animation"],
    },
    DemoMovie {
        title: "Get Out",
        description: "A visit to a girlfriend's family turns sinister.",
        year: 2017,
        duration: 104,
        uploader: "bob",
        genres: &["Horror", "Thriller"],
    },
];

// (movie title, reviewer, score, title, body)
const DEMO_REVIEWS: &[(&str, &str, i32, &str, &str)] = &[
    ("Inception", "bob", 9, "Mind-bending!", "Nolan at his best."),
    ("Inception", "charlie", 8, "Great but complex", "Had to rewatch to understand fully."),
    ("Interstellar", "diana", 10, "Epic", "Visually stunning and emotional."),
    ("The Dark Knight", "alice", 9, "Iconic", "Ledger's Joker is unforgettable."),
    ("Titanic", "diana", 8, "Classic", "Heartbreaking and beautiful."),
    ("Spirited Away", "alice", 9, "Magical", "One of the best animations ever."),
    ("Get Out", "charlie", 7, "Creepy", "Loved the social commentary."),
];

/// Sample catalogue for local development. Demo users have no password and cannot sign in.
pub async fn seed_demo_data(db: &DatabaseConnection) -> anyhow::Result<()> {
    info!("🌱 Seeding demo data...");

    for (name, description) in DEMO_GENRES {
        let exists = Genres::find()
            .filter(genres::Column::Name.eq(*name))
            .one(db)
            .await?;

        if exists.is_none() {
            genres::ActiveModel {
                name: Set(name.to_string()),
                description: Set(Some(description.to_string())),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    for username in DEMO_USERS {
        let email = format!("{}@example.com", username);
        let exists = Users::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(*username))
                    .add(users::Column::Email.eq(email.as_str())),
            )
            .one(db)
            .await?;

        if exists.is_none() {
            users::ActiveModel {
                username: Set(username.to_string()),
                email: Set(email),
                password_hash: Set(None),
                role: Set(UserRole::User),
                is_system: Set(false),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    for demo in DEMO_MOVIES {
        let exists = Movies::find()
            .filter(movies::Column::Title.eq(demo.title))
            .filter(movies::Column::ReleaseYear.eq(demo.year))
            .one(db)
            .await?;
        if exists.is_some() {
            continue;
        }

        let Some(uploader) = find_user(db, demo.uploader).await? else {
            warn!("Skipping demo movie '{}': uploader missing", demo.title);
            continue;
        };

        let movie = movies::ActiveModel {
            title: Set(demo.title.to_string()),
            description: Set(Some(demo.description.to_string())),
            release_year: Set(demo.year),
            duration_min: Set(demo.duration),
            status: Set(MovieStatus::Approved),
            uploaded_by_user_id: Set(uploader.id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        for genre_name in demo.genres {
            let genre = Genres::find()
                .filter(genres::Column::Name.eq(*genre_name))
                .one(db)
                .await?;
            if let Some(genre) = genre {
                MovieGenres::insert(movie_genres::ActiveModel {
                    movie_id: Set(movie.id),
                    genre_id: Set(genre.id),
                })
                .exec_without_returning(db)
                .await?;
            }
        }
    }

    for (movie_title, reviewer, score, title, body) in DEMO_REVIEWS {
        let movie = Movies::find()
            .filter(movies::Column::Title.eq(*movie_title))
            .one(db)
            .await?;
        let user = find_user(db, reviewer).await?;
        let (Some(movie), Some(user)) = (movie, user) else {
            continue;
        };

        let exists = Reviews::find()
            .filter(reviews::Column::MovieId.eq(movie.id))
            .filter(reviews::Column::UserId.eq(user.id))
            .one(db)
            .await?;

        if exists.is_none() {
            reviews::ActiveModel {
                movie_id: Set(movie.id),
                user_id: Set(user.id),
                score: Set(*score),
                title: Set(Some(title.to_string())),
                body: Set(Some(body.to_string())),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    info!("✅ Demo data ready");
    Ok(())
}

async fn find_user(db: &DatabaseConnection, username: &str) -> anyhow::Result<Option<users::Model>> {
    Ok(Users::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await?)
}
