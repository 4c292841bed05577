pub use super::genres::Entity as Genres;
pub use super::movie_genres::Entity as MovieGenres;
pub use super::movies::Entity as Movies;
pub use super::refresh_tokens::Entity as RefreshTokens;
pub use super::reviews::Entity as Reviews;
pub use super::users::Entity as Users;
