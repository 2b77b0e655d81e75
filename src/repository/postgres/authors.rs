//! Authors table

use async_trait::async_trait;

use super::{like_pattern, PgStore};
use crate::{
    error::{AppError, AppResult},
    models::author::{Author, CreateAuthor, UpdateAuthor},
    repository::AuthorStore,
};

#[async_trait]
impl AuthorStore for PgStore {
    async fn list(&self, search: Option<&str>) -> AppResult<Vec<Author>> {
        let rows = match search {
            Some(term) => {
                sqlx::query_as::<_, Author>(
                    r#"
                    SELECT id, name, surname, birth_date FROM authors
                    WHERE name ILIKE $1 OR surname ILIKE $1
                    ORDER BY surname, name, id
                    "#,
                )
                .bind(like_pattern(term))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Author>(
                    "SELECT id, name, surname, birth_date FROM authors ORDER BY surname, name, id",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    async fn find(&self, id: i32) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, name, surname, birth_date FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    async fn insert(&self, data: &CreateAuthor) -> AppResult<Author> {
        let author = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (name, surname, birth_date)
            VALUES ($1, $2, $3)
            RETURNING id, name, surname, birth_date
            "#,
        )
        .bind(&data.name)
        .bind(&data.surname)
        .bind(data.birth_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(author)
    }

    async fn update(&self, id: i32, data: &UpdateAuthor) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors SET
                name = COALESCE($1, name),
                surname = COALESCE($2, surname),
                birth_date = CASE WHEN $3 THEN $4 ELSE birth_date END
            WHERE id = $5
            RETURNING id, name, surname, birth_date
            "#,
        )
        .bind(data.name.as_deref())
        .bind(data.surname.as_deref())
        .bind(data.birth_date.is_some())
        .bind(data.birth_date.flatten())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE author_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if referenced {
            return Err(AppError::Protected(format!(
                "Author {} is referenced by books and cannot be deleted",
                id
            )));
        }

        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}
