//! Book catalog service

use validator::Validate;

use crate::{
    catalog::{BookFilter, PageRequest},
    error::{AppError, AppResult},
    models::book::{BookDetails, BookPage, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    page_size: i64,
}

impl CatalogService {
    pub fn new(repository: Repository, page_size: i64) -> Self {
        Self {
            repository,
            page_size,
        }
    }

    /// List books matching the query filters, newest first, one page at a time.
    /// Pages past the end come back empty; page 1 always succeeds.
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<BookPage> {
        let filter = BookFilter::from_query(query);
        tracing::debug!("Listing books with {:?}", filter);

        let (pagination, items) = self
            .repository
            .books
            .page(&filter, PageRequest::parse(query.page.as_deref()), self.page_size)
            .await?;

        Ok(BookPage {
            items,
            total: pagination.total,
            page: pagination.page,
            per_page: pagination.per_page,
            total_pages: pagination.total_pages,
        })
    }

    /// Get a book by slug
    pub async fn get_book(&self, slug: &str) -> AppResult<BookDetails> {
        self.repository
            .books
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book '{}' not found", slug)))
    }

    /// All books by one author, newest first
    pub async fn books_by_author(&self, author_id: i32) -> AppResult<Vec<BookDetails>> {
        self.repository
            .books
            .filter(&BookFilter::by_author(author_id), None)
            .await
    }

    /// Create a book. The slug is derived from the title unless supplied.
    pub async fn create_book(&self, book: CreateBook) -> AppResult<BookDetails> {
        self.check_references(Some(book.author_id), Some(book.genre_id))
            .await?;

        let created = self.repository.insert_book(book).await?;
        tracing::info!("Created book id={} slug={}", created.id, created.slug);
        Ok(created)
    }

    /// Update a book. Its slug stays the one assigned at creation.
    pub async fn update_book(&self, slug: &str, mut data: UpdateBook) -> AppResult<BookDetails> {
        if let Some(ref title) = data.title {
            data.title = Some(title.trim().to_string());
        }
        data.validate()?;

        let book = self.get_book(slug).await?;
        self.check_references(data.author_id, data.genre_id).await?;

        let updated = self.repository.books.update(book.id, &data).await?;
        tracing::info!("Updated book id={} slug={}", updated.id, updated.slug);
        Ok(updated)
    }

    /// Flip the read flag of a book
    pub async fn toggle_read(&self, slug: &str) -> AppResult<BookDetails> {
        let book = self.get_book(slug).await?;
        let toggled = self.repository.books.toggle_read(book.id).await?;
        tracing::info!("Book id={} marked is_read={}", toggled.id, toggled.is_read);
        Ok(toggled)
    }

    /// Delete a book
    pub async fn delete_book(&self, slug: &str) -> AppResult<()> {
        let book = self.get_book(slug).await?;
        self.repository.books.delete(book.id).await?;
        tracing::info!("Deleted book id={} slug={}", book.id, book.slug);
        Ok(())
    }

    /// Round-trip to the storage backend
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }

    /// Referenced author and genre must exist
    async fn check_references(&self, author_id: Option<i32>, genre_id: Option<i32>) -> AppResult<()> {
        if let Some(id) = author_id {
            if self.repository.authors.find(id).await?.is_none() {
                return Err(AppError::field("author_id", format!("Author {} does not exist", id)));
            }
        }
        if let Some(id) = genre_id {
            if self.repository.genres.find(id).await?.is_none() {
                return Err(AppError::field("genre_id", format!("Genre {} does not exist", id)));
            }
        }
        Ok(())
    }
}
