//! Repository layer: storage traits and the backends implementing them

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    catalog::{normalizer, BookFilter, PageRequest, PageWindow, Pagination},
    error::AppResult,
    models::{
        author::{Author, CreateAuthor, UpdateAuthor},
        book::{BookDetails, CreateBook, NewBook, UpdateBook},
        genre::{CreateGenre, Genre, UpdateGenre},
    },
};

/// Author records. `delete` fails with `Protected` while books reference the author.
#[async_trait]
pub trait AuthorStore: Send + Sync {
    async fn list(&self, search: Option<&str>) -> AppResult<Vec<Author>>;
    async fn find(&self, id: i32) -> AppResult<Option<Author>>;
    async fn insert(&self, data: &CreateAuthor) -> AppResult<Author>;
    async fn update(&self, id: i32, data: &UpdateAuthor) -> AppResult<Author>;
    async fn delete(&self, id: i32) -> AppResult<()>;
}

/// Genre records. Slugs are unique; `delete` is protected like authors.
#[async_trait]
pub trait GenreStore: Send + Sync {
    async fn list(&self, search: Option<&str>) -> AppResult<Vec<Genre>>;
    async fn find(&self, id: i32) -> AppResult<Option<Genre>>;
    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Genre>>;
    async fn insert(&self, data: &CreateGenre) -> AppResult<Genre>;
    async fn update(&self, id: i32, data: &UpdateGenre) -> AppResult<Genre>;
    async fn delete(&self, id: i32) -> AppResult<()>;
}

/// Book records, always returned joined with author and genre and ordered
/// newest first. `insert` enforces slug uniqueness and references.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn find(&self, id: i32) -> AppResult<Option<BookDetails>>;
    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<BookDetails>>;
    async fn slug_exists(&self, slug: &str) -> AppResult<bool>;
    async fn filter(&self, filter: &BookFilter, window: Option<PageWindow>) -> AppResult<Vec<BookDetails>>;
    async fn count(&self, filter: &BookFilter) -> AppResult<i64>;
    /// Count and page window read from one consistent snapshot
    async fn page(
        &self,
        filter: &BookFilter,
        request: PageRequest,
        per_page: i64,
    ) -> AppResult<(Pagination, Vec<BookDetails>)>;
    async fn insert(&self, book: &NewBook) -> AppResult<BookDetails>;
    async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<BookDetails>;
    async fn toggle_read(&self, id: i32) -> AppResult<BookDetails>;
    async fn delete(&self, id: i32) -> AppResult<()>;
}

/// Main repository struct holding one store per record type
#[derive(Clone)]
pub struct Repository {
    pub authors: Arc<dyn AuthorStore>,
    pub genres: Arc<dyn GenreStore>,
    pub books: Arc<dyn BookStore>,
}

impl Repository {
    pub fn new(
        authors: Arc<dyn AuthorStore>,
        genres: Arc<dyn GenreStore>,
        books: Arc<dyn BookStore>,
    ) -> Self {
        Self {
            authors,
            genres,
            books,
        }
    }

    /// Repository backed by PostgreSQL
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        let store = Arc::new(postgres::PgStore::new(pool));
        Self::new(store.clone(), store.clone(), store)
    }

    /// Repository backed by process memory
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::new());
        Self::new(store.clone(), store.clone(), store)
    }

    /// Insert a new book: normalize (validate, settle slug), check the slug
    /// is free, then persist.
    pub async fn insert_book(&self, draft: CreateBook) -> AppResult<BookDetails> {
        let book = normalizer::prepare_for_create(self.books.as_ref(), draft).await?;
        self.books.insert(&book).await
    }

    /// Cheap round-trip to the store, used by readiness checks
    pub async fn ping(&self) -> AppResult<()> {
        self.books.count(&BookFilter::default()).await.map(|_| ())
    }
}
