//! In-process store.
//!
//! Holds all three tables behind one lock so that each write checks its
//! constraints (unique slugs, existing references, protected deletes) and
//! applies atomically, the same guarantees the PostgreSQL schema gives.

use std::{cmp::Reverse, collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{AuthorStore, BookStore, GenreStore};
use crate::{
    catalog::{BookFilter, PageRequest, PageWindow, Pagination},
    error::{AppError, AppResult},
    models::{
        author::{Author, CreateAuthor, UpdateAuthor},
        book::{Book, BookAuthor, BookDetails, BookGenre, NewBook, UpdateBook},
        genre::{CreateGenre, Genre, UpdateGenre},
    },
};

#[derive(Default)]
struct Tables {
    authors: BTreeMap<i32, Author>,
    genres: BTreeMap<i32, Genre>,
    books: BTreeMap<i32, Book>,
    last_author_id: i32,
    last_genre_id: i32,
    last_book_id: i32,
}

fn next_id(last: &mut i32) -> i32 {
    *last += 1;
    *last
}

fn apply_window(books: Vec<BookDetails>, window: PageWindow) -> Vec<BookDetails> {
    books
        .into_iter()
        .skip(window.offset.max(0) as usize)
        .take(window.limit.max(0) as usize)
        .collect()
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl Tables {
    fn details(&self, book: &Book) -> AppResult<BookDetails> {
        let author = self.authors.get(&book.author_id).ok_or_else(|| {
            AppError::Internal(format!("Book {} references missing author {}", book.id, book.author_id))
        })?;
        let genre = self.genres.get(&book.genre_id).ok_or_else(|| {
            AppError::Internal(format!("Book {} references missing genre {}", book.id, book.genre_id))
        })?;

        Ok(BookDetails {
            id: book.id,
            title: book.title.clone(),
            slug: book.slug.clone(),
            description: book.description.clone(),
            author: BookAuthor {
                id: author.id,
                name: author.name.clone(),
                surname: author.surname.clone(),
            },
            genre: BookGenre {
                id: genre.id,
                name: genre.name.clone(),
                slug: genre.slug.clone(),
            },
            quantity: book.quantity,
            created_at: book.created_at,
            is_read: book.is_read,
        })
    }

    /// Newest first; ids break ties between books created in the same instant
    fn matching(&self, filter: &BookFilter) -> AppResult<Vec<BookDetails>> {
        let mut books = Vec::new();
        for book in self.books.values() {
            let details = self.details(book)?;
            if filter.matches(&details) {
                books.push(details);
            }
        }
        books.sort_by_key(|b| Reverse((b.created_at, b.id)));
        Ok(books)
    }

    fn check_references(&self, author_id: i32, genre_id: i32) -> AppResult<()> {
        if !self.authors.contains_key(&author_id) {
            return Err(AppError::field("author_id", format!("Author {} does not exist", author_id)));
        }
        if !self.genres.contains_key(&genre_id) {
            return Err(AppError::field("genre_id", format!("Genre {} does not exist", genre_id)));
        }
        Ok(())
    }

    fn genre_slug_taken(&self, slug: &str, except: Option<i32>) -> bool {
        self.genres
            .values()
            .any(|g| g.slug == slug && Some(g.id) != except)
    }
}

/// Store keeping every table in memory; clones share the same data
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthorStore for MemoryStore {
    async fn list(&self, search: Option<&str>) -> AppResult<Vec<Author>> {
        let tables = self.tables.read().await;
        let mut authors: Vec<Author> = tables
            .authors
            .values()
            .filter(|a| match search {
                Some(term) => contains_ci(&a.name, term) || contains_ci(&a.surname, term),
                None => true,
            })
            .cloned()
            .collect();
        authors.sort_by(|a, b| (&a.surname, &a.name, a.id).cmp(&(&b.surname, &b.name, b.id)));
        Ok(authors)
    }

    async fn find(&self, id: i32) -> AppResult<Option<Author>> {
        Ok(self.tables.read().await.authors.get(&id).cloned())
    }

    async fn insert(&self, data: &CreateAuthor) -> AppResult<Author> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.last_author_id);
        let author = Author {
            id,
            name: data.name.clone(),
            surname: data.surname.clone(),
            birth_date: data.birth_date,
        };
        tables.authors.insert(id, author.clone());
        Ok(author)
    }

    async fn update(&self, id: i32, data: &UpdateAuthor) -> AppResult<Author> {
        let mut tables = self.tables.write().await;
        let author = tables
            .authors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))?;

        if let Some(ref name) = data.name {
            author.name = name.clone();
        }
        if let Some(ref surname) = data.surname {
            author.surname = surname.clone();
        }
        if let Some(birth_date) = data.birth_date {
            author.birth_date = birth_date;
        }
        Ok(author.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.authors.contains_key(&id) {
            return Err(AppError::NotFound(format!("Author {} not found", id)));
        }
        if tables.books.values().any(|b| b.author_id == id) {
            return Err(AppError::Protected(format!(
                "Author {} is referenced by books and cannot be deleted",
                id
            )));
        }
        tables.authors.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl GenreStore for MemoryStore {
    async fn list(&self, search: Option<&str>) -> AppResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        let mut genres: Vec<Genre> = tables
            .genres
            .values()
            .filter(|g| match search {
                Some(term) => contains_ci(&g.name, term) || contains_ci(&g.slug, term),
                None => true,
            })
            .cloned()
            .collect();
        genres.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(genres)
    }

    async fn find(&self, id: i32) -> AppResult<Option<Genre>> {
        Ok(self.tables.read().await.genres.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Genre>> {
        let tables = self.tables.read().await;
        Ok(tables.genres.values().find(|g| g.slug == slug).cloned())
    }

    async fn insert(&self, data: &CreateGenre) -> AppResult<Genre> {
        let mut tables = self.tables.write().await;
        if tables.genre_slug_taken(&data.slug, None) {
            return Err(AppError::Conflict(format!(
                "A genre with slug '{}' already exists",
                data.slug
            )));
        }
        let id = next_id(&mut tables.last_genre_id);
        let genre = Genre {
            id,
            name: data.name.clone(),
            slug: data.slug.clone(),
        };
        tables.genres.insert(id, genre.clone());
        Ok(genre)
    }

    async fn update(&self, id: i32, data: &UpdateGenre) -> AppResult<Genre> {
        let mut tables = self.tables.write().await;
        if !tables.genres.contains_key(&id) {
            return Err(AppError::NotFound(format!("Genre {} not found", id)));
        }
        if let Some(ref slug) = data.slug {
            if tables.genre_slug_taken(slug, Some(id)) {
                return Err(AppError::Conflict(format!(
                    "A genre with slug '{}' already exists",
                    slug
                )));
            }
        }

        let genre = tables
            .genres
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))?;
        if let Some(ref name) = data.name {
            genre.name = name.clone();
        }
        if let Some(ref slug) = data.slug {
            genre.slug = slug.clone();
        }
        Ok(genre.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.genres.contains_key(&id) {
            return Err(AppError::NotFound(format!("Genre {} not found", id)));
        }
        if tables.books.values().any(|b| b.genre_id == id) {
            return Err(AppError::Protected(format!(
                "Genre {} is referenced by books and cannot be deleted",
                id
            )));
        }
        tables.genres.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn find(&self, id: i32) -> AppResult<Option<BookDetails>> {
        let tables = self.tables.read().await;
        tables.books.get(&id).map(|b| tables.details(b)).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<BookDetails>> {
        let tables = self.tables.read().await;
        tables
            .books
            .values()
            .find(|b| b.slug == slug)
            .map(|b| tables.details(b))
            .transpose()
    }

    async fn slug_exists(&self, slug: &str) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.books.values().any(|b| b.slug == slug))
    }

    async fn filter(&self, filter: &BookFilter, window: Option<PageWindow>) -> AppResult<Vec<BookDetails>> {
        let tables = self.tables.read().await;
        let books = tables.matching(filter)?;
        Ok(match window {
            Some(w) => apply_window(books, w),
            None => books,
        })
    }

    async fn count(&self, filter: &BookFilter) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.matching(filter)?.len() as i64)
    }

    async fn page(
        &self,
        filter: &BookFilter,
        request: PageRequest,
        per_page: i64,
    ) -> AppResult<(Pagination, Vec<BookDetails>)> {
        let tables = self.tables.read().await;
        let books = tables.matching(filter)?;
        let pagination = Pagination::new(request, per_page, books.len() as i64);
        let items = match pagination.window() {
            Some(w) => apply_window(books, w),
            None => Vec::new(),
        };
        Ok((pagination, items))
    }

    async fn insert(&self, book: &NewBook) -> AppResult<BookDetails> {
        let mut tables = self.tables.write().await;
        if tables.books.values().any(|b| b.slug == book.slug) {
            return Err(AppError::Conflict(format!(
                "A book with slug '{}' already exists",
                book.slug
            )));
        }
        tables.check_references(book.author_id, book.genre_id)?;

        let id = next_id(&mut tables.last_book_id);
        let stored = Book {
            id,
            title: book.title.clone(),
            slug: book.slug.clone(),
            description: book.description.clone(),
            author_id: book.author_id,
            genre_id: book.genre_id,
            quantity: book.quantity,
            created_at: Utc::now(),
            is_read: book.is_read,
        };
        let details = tables.details(&stored)?;
        tables.books.insert(id, stored);
        Ok(details)
    }

    async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<BookDetails> {
        let mut tables = self.tables.write().await;
        let current = tables
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

        let mut updated = current;
        if let Some(ref title) = data.title {
            updated.title = title.clone();
        }
        if let Some(ref description) = data.description {
            updated.description = description.clone();
        }
        if let Some(author_id) = data.author_id {
            updated.author_id = author_id;
        }
        if let Some(genre_id) = data.genre_id {
            updated.genre_id = genre_id;
        }
        if let Some(quantity) = data.quantity {
            updated.quantity = quantity;
        }
        tables.check_references(updated.author_id, updated.genre_id)?;

        let details = tables.details(&updated)?;
        tables.books.insert(id, updated);
        Ok(details)
    }

    async fn toggle_read(&self, id: i32) -> AppResult<BookDetails> {
        let mut tables = self.tables.write().await;
        let book = tables
            .books
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
        book.is_read = !book.is_read;
        let book = book.clone();
        tables.details(&book)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryStore, Author, Genre) {
        let store = MemoryStore::new();
        let author = AuthorStore::insert(
            &store,
            &CreateAuthor {
                name: "Stephen".to_string(),
                surname: "King".to_string(),
                birth_date: None,
            },
        )
        .await
        .unwrap();
        let genre = GenreStore::insert(
            &store,
            &CreateGenre {
                name: "Fantasy".to_string(),
                slug: "fantasy".to_string(),
            },
        )
        .await
        .unwrap();
        (store, author, genre)
    }

    fn new_book(slug: &str, author_id: i32, genre_id: i32) -> NewBook {
        NewBook {
            title: slug.to_string(),
            slug: slug.to_string(),
            description: String::new(),
            author_id,
            genre_id,
            quantity: 100,
            is_read: false,
        }
    }

    #[tokio::test]
    async fn test_book_slug_is_unique() {
        let (store, author, genre) = seeded().await;
        BookStore::insert(&store, &new_book("it", author.id, genre.id)).await.unwrap();

        let err = BookStore::insert(&store, &new_book("it", author.id, genre.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_book_references_must_exist() {
        let (store, author, genre) = seeded().await;

        let err = BookStore::insert(&store, &new_book("it", 999, genre.id)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFields(ref f) if f.contains_key("author_id")));

        let err = BookStore::insert(&store, &new_book("it", author.id, 999)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFields(ref f) if f.contains_key("genre_id")));
    }

    #[tokio::test]
    async fn test_referenced_records_are_protected() {
        let (store, author, genre) = seeded().await;
        let book = BookStore::insert(&store, &new_book("it", author.id, genre.id)).await.unwrap();

        let err = AuthorStore::delete(&store, author.id).await.unwrap_err();
        assert!(matches!(err, AppError::Protected(_)));
        let err = GenreStore::delete(&store, genre.id).await.unwrap_err();
        assert!(matches!(err, AppError::Protected(_)));

        BookStore::delete(&store, book.id).await.unwrap();
        AuthorStore::delete(&store, author.id).await.unwrap();
        GenreStore::delete(&store, genre.id).await.unwrap();
        assert!(AuthorStore::find(&store, author.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_newest_first_with_window() {
        let (store, author, genre) = seeded().await;
        for slug in ["a", "b", "c"] {
            BookStore::insert(&store, &new_book(slug, author.id, genre.id)).await.unwrap();
        }

        let all = store.filter(&BookFilter::default(), None).await.unwrap();
        let slugs: Vec<&str> = all.iter().map(|b| b.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c", "b", "a"]);

        let window = PageWindow { limit: 2, offset: 2 };
        let page = store.filter(&BookFilter::default(), Some(window)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].slug, "a");
    }

    #[tokio::test]
    async fn test_page_reads_count_and_rows_together() {
        let (store, author, genre) = seeded().await;
        for slug in ["a", "b", "c", "d", "e", "f"] {
            BookStore::insert(&store, &new_book(slug, author.id, genre.id)).await.unwrap();
        }

        let (pagination, items) = store
            .page(&BookFilter::default(), PageRequest::Last, 5)
            .await
            .unwrap();
        assert_eq!(pagination.total, 6);
        assert_eq!(pagination.page, 2);
        let slugs: Vec<&str> = items.iter().map(|b| b.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a"]);

        let (pagination, items) = store
            .page(&BookFilter::default(), PageRequest::Number(3), 5)
            .await
            .unwrap();
        assert_eq!(pagination.total_pages, 2);
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_read_twice_restores() {
        let (store, author, genre) = seeded().await;
        let book = BookStore::insert(&store, &new_book("it", author.id, genre.id)).await.unwrap();

        assert!(store.toggle_read(book.id).await.unwrap().is_read);
        assert!(!store.toggle_read(book.id).await.unwrap().is_read);
    }

    #[tokio::test]
    async fn test_genre_slug_is_unique() {
        let (store, _, genre) = seeded().await;
        let other = GenreStore::insert(
            &store,
            &CreateGenre {
                name: "Novel".to_string(),
                slug: "novel".to_string(),
            },
        )
        .await
        .unwrap();

        let err = GenreStore::update(
            &store,
            other.id,
            &UpdateGenre {
                name: None,
                slug: Some(genre.slug.clone()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_search() {
        let (store, _, _) = seeded().await;
        assert_eq!(AuthorStore::list(&store, Some("kin")).await.unwrap().len(), 1);
        assert!(AuthorStore::list(&store, Some("tolstoy")).await.unwrap().is_empty());
        assert_eq!(GenreStore::list(&store, Some("FANT")).await.unwrap().len(), 1);
    }
}
