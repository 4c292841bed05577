pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::api::handlers::{auth, genres, health, movies, reviews, users};
use crate::api::middleware::auth::{identity_middleware, require_auth};
use crate::api::middleware::request_id::request_id_middleware;
use crate::config::AppConfig;
use crate::services::auth_service::AuthService;
use crate::services::genre_service::GenreService;
use crate::services::movie_service::MovieService;
use crate::services::review_service::ReviewService;
use crate::services::user_service::UserService;
use axum::{
    Router,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{MethodRouter, get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub auth: Arc<AuthService>,
    pub movies: Arc<MovieService>,
    pub reviews: Arc<ReviewService>,
    pub genres: Arc<GenreService>,
    pub users: Arc<UserService>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            auth: Arc::new(AuthService::new(db.clone(), config.clone())),
            movies: Arc::new(MovieService::new(db.clone())),
            reviews: Arc::new(ReviewService::new(db.clone())),
            genres: Arc::new(GenreService::new(db.clone())),
            users: Arc::new(UserService::new(db.clone())),
            db,
            config,
        }
    }
}

/// Methods that reject anonymous callers before reaching the handler.
fn authed(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(from_fn(require_auth))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any)
}

pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/revoke", post(auth::revoke))
        .route(
            "/movies",
            get(movies::list_movies).merge(authed(post(movies::create_movie))),
        )
        .route(
            "/movies/:id",
            get(movies::get_movie)
                .merge(authed(put(movies::update_movie).delete(movies::delete_movie))),
        )
        .route("/movies/:id/reviews", get(movies::movie_reviews))
        .route(
            "/movies/approve/:id",
            authed(post(movies::approve_movie).put(movies::approve_movie)),
        )
        .route(
            "/movies/reject/:id",
            authed(post(movies::reject_movie).put(movies::reject_movie)),
        )
        .route(
            "/reviews",
            get(reviews::list_reviews).merge(authed(post(reviews::create_review))),
        )
        .route(
            "/reviews/:id",
            authed(
                get(reviews::get_review)
                    .put(reviews::update_review)
                    .delete(reviews::delete_review),
            ),
        )
        .route(
            "/genres",
            get(genres::list_genres).merge(authed(post(genres::create_genre))),
        )
        .route(
            "/genres/:id",
            get(genres::get_genre)
                .merge(authed(put(genres::update_genre).delete(genres::delete_genre))),
        )
        .route(
            "/users",
            authed(get(users::list_users).post(users::create_user)),
        )
        .route("/users/me", authed(get(users::get_profile)))
        .route("/users/movies", authed(get(users::my_movies)))
        .route("/users/reviews", authed(get(users::my_reviews)))
        .route(
            "/users/:id",
            authed(
                get(users::get_user)
                    .put(users::update_user)
                    .delete(users::delete_user),
            ),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .layer(from_fn_with_state(state.clone(), identity_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer(&state.config.allowed_origins))
        .with_state(state)
}
