//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Maximum length of book and genre slugs
pub const SLUG_MAX_LEN: usize = 200;

/// Book record as stored (references by id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub author_id: i32,
    pub genre_id: i32,
    /// Page count, always > 0
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// Author summary embedded in a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookAuthor {
    pub id: i32,
    pub name: String,
    pub surname: String,
}

/// Genre summary embedded in a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookGenre {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

/// Book joined with its author and genre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookDetails {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub author: BookAuthor,
    pub genre: BookGenre,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// Create book request. `slug` is derived from the title when omitted.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(max = 200, message = "Slug must be at most 200 characters"))]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub author_id: i32,
    pub genre_id: i32,
    #[validate(range(min = 1, message = "Page count must be a positive number"))]
    pub quantity: i32,
    #[serde(default)]
    pub is_read: bool,
}

/// A book ready to be inserted: validated, with its final slug
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub author_id: i32,
    pub genre_id: i32,
    pub quantity: i32,
    pub is_read: bool,
}

/// Update book request. The slug is fixed at creation and cannot be changed here.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub author_id: Option<i32>,
    pub genre_id: Option<i32>,
    #[validate(range(min = 1, message = "Page count must be a positive number"))]
    pub quantity: Option<i32>,
}

/// Book listing query parameters. Values are kept as raw strings; malformed
/// filters are ignored rather than rejected.
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Genre slug (exact, case-sensitive)
    pub genre: Option<String>,
    /// Author id
    pub author: Option<String>,
    /// "true" or "false" (case-insensitive)
    pub read: Option<String>,
    /// Page number (default 1) or "last"
    pub page: Option<String>,
}

/// One page of books
#[derive(Debug, Serialize, ToSchema)]
pub struct BookPage {
    pub items: Vec<BookDetails>,
    /// Number of books matching the filters
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}
