pub mod auth;
pub mod hash;
pub mod password;
pub mod search;
