//! Books table, always read joined with authors and genres

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, QueryBuilder};

use super::PgStore;
use crate::{
    catalog::{BookFilter, PageRequest, PageWindow, Pagination},
    error::{AppError, AppResult},
    models::book::{BookAuthor, BookDetails, BookGenre, NewBook, UpdateBook},
    repository::BookStore,
};

const BOOK_SELECT: &str = r#"
    SELECT b.id, b.title, b.slug, b.description, b.quantity, b.created_at, b.is_read,
           a.id AS author_id, a.name AS author_name, a.surname AS author_surname,
           g.id AS genre_id, g.name AS genre_name, g.slug AS genre_slug
    FROM books b
    JOIN authors a ON a.id = b.author_id
    JOIN genres g ON g.id = b.genre_id
"#;

/// Flat join row
#[derive(FromRow)]
struct BookRow {
    id: i32,
    title: String,
    slug: String,
    description: String,
    quantity: i32,
    created_at: DateTime<Utc>,
    is_read: bool,
    author_id: i32,
    author_name: String,
    author_surname: String,
    genre_id: i32,
    genre_name: String,
    genre_slug: String,
}

impl From<BookRow> for BookDetails {
    fn from(r: BookRow) -> Self {
        BookDetails {
            id: r.id,
            title: r.title,
            slug: r.slug,
            description: r.description,
            author: BookAuthor {
                id: r.author_id,
                name: r.author_name,
                surname: r.author_surname,
            },
            genre: BookGenre {
                id: r.genre_id,
                name: r.genre_name,
                slug: r.genre_slug,
            },
            quantity: r.quantity,
            created_at: r.created_at,
            is_read: r.is_read,
        }
    }
}

/// Append the WHERE clause for `filter`, one bound parameter per condition
fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    qb.push(" WHERE TRUE");
    if let Some(ref slug) = filter.genre_slug {
        qb.push(" AND g.slug = ").push_bind(slug.clone());
    }
    if let Some(author_id) = filter.author_id {
        qb.push(" AND b.author_id = ").push_bind(author_id);
    }
    if let Some(is_read) = filter.is_read {
        qb.push(" AND b.is_read = ").push_bind(is_read);
    }
}

fn select_query(filter: &BookFilter, window: Option<PageWindow>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(BOOK_SELECT);
    push_conditions(&mut qb, filter);
    qb.push(" ORDER BY b.created_at DESC, b.id DESC");
    if let Some(w) = window {
        qb.push(" LIMIT ").push_bind(w.limit);
        qb.push(" OFFSET ").push_bind(w.offset);
    }
    qb
}

fn count_query(filter: &BookFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM books b JOIN genres g ON g.id = b.genre_id",
    );
    push_conditions(&mut qb, filter);
    qb
}

/// Request field behind a books foreign key
fn reference_field(constraint: Option<&str>) -> (&'static str, &'static str) {
    match constraint {
        Some("books_genre_id_fkey") => ("genre_id", "Referenced genre does not exist"),
        _ => ("author_id", "Referenced author does not exist"),
    }
}

/// Map constraint failures on insert/update to client-facing errors
fn write_error(err: sqlx::Error, slug: Option<&str>) -> AppError {
    if let sqlx::Error::Database(ref db) = err {
        if db.is_foreign_key_violation() {
            let (field, message) = reference_field(db.constraint());
            return AppError::field(field, message);
        }
    }
    match AppError::from(err) {
        AppError::Conflict(_) => AppError::Conflict(format!(
            "A book with slug '{}' already exists",
            slug.unwrap_or_default()
        )),
        other => other,
    }
}

impl PgStore {
    async fn book_by_id(&self, id: i32) -> AppResult<BookDetails> {
        BookStore::find(self, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }
}

#[async_trait]
impl BookStore for PgStore {
    async fn find(&self, id: i32) -> AppResult<Option<BookDetails>> {
        let row = sqlx::query_as::<_, BookRow>(&format!("{} WHERE b.id = $1", BOOK_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(BookDetails::from))
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<BookDetails>> {
        let row = sqlx::query_as::<_, BookRow>(&format!("{} WHERE b.slug = $1", BOOK_SELECT))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(BookDetails::from))
    }

    async fn slug_exists(&self, slug: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn filter(&self, filter: &BookFilter, window: Option<PageWindow>) -> AppResult<Vec<BookDetails>> {
        let mut qb = select_query(filter, window);
        let rows = qb.build_query_as::<BookRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(BookDetails::from).collect())
    }

    async fn count(&self, filter: &BookFilter) -> AppResult<i64> {
        let mut qb = count_query(filter);
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn page(
        &self,
        filter: &BookFilter,
        request: PageRequest,
        per_page: i64,
    ) -> AppResult<(Pagination, Vec<BookDetails>)> {
        // Count and rows must see the same snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut count = count_query(filter);
        let total: i64 = count.build_query_scalar().fetch_one(&mut *tx).await?;
        let pagination = Pagination::new(request, per_page, total);

        let items = match pagination.window() {
            Some(window) => {
                let mut select = select_query(filter, Some(window));
                let rows = select.build_query_as::<BookRow>().fetch_all(&mut *tx).await?;
                rows.into_iter().map(BookDetails::from).collect()
            }
            None => Vec::new(),
        };

        tx.commit().await?;
        Ok((pagination, items))
    }

    async fn insert(&self, book: &NewBook) -> AppResult<BookDetails> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, slug, description, author_id, genre_id, quantity, is_read)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.slug)
        .bind(&book.description)
        .bind(book.author_id)
        .bind(book.genre_id)
        .bind(book.quantity)
        .bind(book.is_read)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, Some(&book.slug)))?;

        self.book_by_id(id).await
    }

    async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<BookDetails> {
        let updated: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE books SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                author_id = COALESCE($3, author_id),
                genre_id = COALESCE($4, genre_id),
                quantity = COALESCE($5, quantity)
            WHERE id = $6
            RETURNING id
            "#,
        )
        .bind(data.title.as_deref())
        .bind(data.description.as_deref())
        .bind(data.author_id)
        .bind(data.genre_id)
        .bind(data.quantity)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, None))?;

        match updated {
            Some(id) => self.book_by_id(id).await,
            None => Err(AppError::NotFound(format!("Book {} not found", id))),
        }
    }

    async fn toggle_read(&self, id: i32) -> AppResult<BookDetails> {
        let toggled: Option<i32> =
            sqlx::query_scalar("UPDATE books SET is_read = NOT is_read WHERE id = $1 RETURNING id")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match toggled {
            Some(id) => self.book_by_id(id).await,
            None => Err(AppError::NotFound(format!("Book {} not found", id))),
        }
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }
}
