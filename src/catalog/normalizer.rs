//! Pre-persist step for new books.
//!
//! Runs before every book insert, in this order: trim and validate the draft,
//! then settle the slug (keep a supplied one, else derive one from the title),
//! then make sure the slug is free. The store's own unique constraint still
//! guards the final write against concurrent inserts.

use validator::Validate;

use super::slug::{derive_slug, is_valid_slug, with_suffix};
use crate::{
    error::{AppError, AppResult},
    models::book::{CreateBook, NewBook},
    repository::BookStore,
};

/// Highest numeric suffix tried before giving up on a derived slug
pub const MAX_SLUG_SUFFIX: u32 = 100;

/// Validate a draft and give it its final slug.
///
/// A supplied slug is kept as is; it must be well-formed and unused. A derived
/// slug that collides gets the first free `-2`, `-3`, ... suffix.
pub async fn prepare_for_create(books: &dyn BookStore, mut draft: CreateBook) -> AppResult<NewBook> {
    draft.title = draft.title.trim().to_string();
    draft.validate()?;

    let slug = match draft.slug.as_deref().filter(|s| !s.is_empty()) {
        Some(supplied) => {
            if !is_valid_slug(supplied) {
                return Err(AppError::field(
                    "slug",
                    "Slug may only contain letters, digits, hyphens and underscores",
                ));
            }
            if books.slug_exists(supplied).await? {
                return Err(AppError::Conflict(format!(
                    "A book with slug '{}' already exists",
                    supplied
                )));
            }
            supplied.to_string()
        }
        None => unique_slug(books, &draft.title).await?,
    };

    Ok(NewBook {
        title: draft.title,
        slug,
        description: draft.description,
        author_id: draft.author_id,
        genre_id: draft.genre_id,
        quantity: draft.quantity,
        is_read: draft.is_read,
    })
}

async fn unique_slug(books: &dyn BookStore, title: &str) -> AppResult<String> {
    let base = derive_slug(title);
    if !books.slug_exists(&base).await? {
        return Ok(base);
    }

    for n in 2..=MAX_SLUG_SUFFIX {
        let candidate = with_suffix(&base, n);
        if !books.slug_exists(&candidate).await? {
            tracing::debug!("Slug '{}' taken, using '{}'", base, candidate);
            return Ok(candidate);
        }
    }

    Err(AppError::Conflict(format!(
        "Could not find a free slug for '{}'",
        title
    )))
}
