use crate::entities::genres;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<genres::Model> for GenreDto {
    fn from(g: genres::Model) -> Self {
        Self {
            id: g.id,
            name: g.name,
            description: g.description,
        }
    }
}

/// Body for both create and update.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenreRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GenreListQuery {
    pub q: Option<String>,
}
