//! Genres service

use validator::Validate;

use crate::{
    catalog::slug::is_valid_slug,
    error::{AppError, AppResult},
    models::genre::{CreateGenre, Genre, GenreQuery, UpdateGenre},
    repository::Repository,
};

#[derive(Clone)]
pub struct GenresService {
    repository: Repository,
}

fn check_slug(slug: &str) -> AppResult<()> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(AppError::field(
            "slug",
            "Slug may only contain letters, numbers, underscores or hyphens",
        ))
    }
}

impl GenresService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &GenreQuery) -> AppResult<Vec<Genre>> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        self.repository.genres.list(search).await
    }

    pub async fn get(&self, id: i32) -> AppResult<Genre> {
        self.repository
            .genres
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    pub async fn create(&self, mut data: CreateGenre) -> AppResult<Genre> {
        data.name = data.name.trim().to_string();
        data.slug = data.slug.trim().to_string();
        data.validate()?;
        check_slug(&data.slug)?;

        let genre = self.repository.genres.insert(&data).await?;
        tracing::info!("Created genre id={} slug={}", genre.id, genre.slug);
        Ok(genre)
    }

    pub async fn update(&self, id: i32, mut data: UpdateGenre) -> AppResult<Genre> {
        data.name = data.name.map(|n| n.trim().to_string());
        data.slug = data.slug.map(|s| s.trim().to_string());
        data.validate()?;
        if let Some(ref slug) = data.slug {
            check_slug(slug)?;
        }

        let genre = self.repository.genres.update(id, &data).await?;
        tracing::info!("Updated genre id={} slug={}", genre.id, genre.slug);
        Ok(genre)
    }

    /// Fails with `Protected` while any book references the genre
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.genres.delete(id).await?;
        tracing::info!("Deleted genre id={}", id);
        Ok(())
    }
}
