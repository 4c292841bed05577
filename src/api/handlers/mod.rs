pub mod auth;
pub mod genres;
pub mod health;
pub mod movies;
pub mod reviews;
pub mod users;
