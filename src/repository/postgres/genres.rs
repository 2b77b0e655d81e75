//! Genres table

use async_trait::async_trait;

use super::{like_pattern, PgStore};
use crate::{
    error::{AppError, AppResult},
    models::genre::{CreateGenre, Genre, UpdateGenre},
    repository::GenreStore,
};

/// Turn the generic unique-key conflict into one naming the slug
fn slug_conflict(err: sqlx::Error, slug: &str) -> AppError {
    match AppError::from(err) {
        AppError::Conflict(_) => {
            AppError::Conflict(format!("A genre with slug '{}' already exists", slug))
        }
        other => other,
    }
}

#[async_trait]
impl GenreStore for PgStore {
    async fn list(&self, search: Option<&str>) -> AppResult<Vec<Genre>> {
        let rows = match search {
            Some(term) => {
                sqlx::query_as::<_, Genre>(
                    r#"
                    SELECT id, name, slug FROM genres
                    WHERE name ILIKE $1 OR slug ILIKE $1
                    ORDER BY name, id
                    "#,
                )
                .bind(like_pattern(term))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Genre>("SELECT id, name, slug FROM genres ORDER BY name, id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }

    async fn find(&self, id: i32) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>("SELECT id, name, slug FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(genre)
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>("SELECT id, name, slug FROM genres WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(genre)
    }

    async fn insert(&self, data: &CreateGenre) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(&data.name)
        .bind(&data.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| slug_conflict(e, &data.slug))
    }

    async fn update(&self, id: i32, data: &UpdateGenre) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>(
            r#"
            UPDATE genres SET
                name = COALESCE($1, name),
                slug = COALESCE($2, slug)
            WHERE id = $3
            RETURNING id, name, slug
            "#,
        )
        .bind(data.name.as_deref())
        .bind(data.slug.as_deref())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| slug_conflict(e, data.slug.as_deref().unwrap_or_default()))?
        .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE genre_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if referenced {
            return Err(AppError::Protected(format!(
                "Genre {} is referenced by books and cannot be deleted",
                id
            )));
        }

        let result = sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Genre {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}
