//! Book filter composition.
//!
//! Listing parameters arrive as raw, independently optional strings. They are
//! folded into a [`BookFilter`], a conjunction of the conditions that were
//! present and well-formed. Anything malformed is dropped, never reported.
//! Storage backends either evaluate the filter directly with
//! [`BookFilter::matches`] or translate it into their own query language.

use crate::models::book::{BookDetails, BookQuery};

/// Conjunctive predicate over books. `None` fields impose no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Exact, case-sensitive genre slug
    pub genre_slug: Option<String>,
    pub author_id: Option<i32>,
    pub is_read: Option<bool>,
}

impl BookFilter {
    /// Build a filter from raw parameter values.
    pub fn compose(genre: Option<&str>, author: Option<&str>, read: Option<&str>) -> Self {
        Self {
            genre_slug: parse_genre(genre),
            author_id: parse_author(author),
            is_read: parse_read(read),
        }
    }

    pub fn from_query(query: &BookQuery) -> Self {
        Self::compose(
            query.genre.as_deref(),
            query.author.as_deref(),
            query.read.as_deref(),
        )
    }

    /// All books written by one author
    pub fn by_author(author_id: i32) -> Self {
        Self {
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.genre_slug.is_none() && self.author_id.is_none() && self.is_read.is_none()
    }

    /// Evaluate the predicate against one book
    pub fn matches(&self, book: &BookDetails) -> bool {
        if let Some(ref slug) = self.genre_slug {
            if book.genre.slug != *slug {
                return false;
            }
        }
        if let Some(author_id) = self.author_id {
            if book.author.id != author_id {
                return false;
            }
        }
        if let Some(is_read) = self.is_read {
            if book.is_read != is_read {
                return false;
            }
        }
        true
    }
}

fn parse_genre(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn parse_author(value: Option<&str>) -> Option<i32> {
    value.and_then(|v| v.trim().parse::<i32>().ok())
}

fn parse_read(value: Option<&str>) -> Option<bool> {
    match value?.to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
