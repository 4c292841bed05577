pub mod prelude;

pub mod genres;
pub mod movie_genres;
pub mod movies;
pub mod refresh_tokens;
pub mod reviews;
pub mod users;
