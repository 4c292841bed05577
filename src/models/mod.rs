//! Request and response bodies exchanged over the JSON API.

pub mod auth;
pub mod genre;
pub mod movie;
pub mod review;
pub mod user;
