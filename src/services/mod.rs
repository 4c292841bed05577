pub mod access;
pub mod auth_service;
pub mod genre_service;
pub mod movie_service;
pub mod review_service;
pub mod user_service;
