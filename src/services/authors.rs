//! Authors service

use validator::Validate;

use crate::{
    catalog::BookFilter,
    error::{AppError, AppResult},
    models::author::{Author, AuthorDetails, AuthorQuery, CreateAuthor, UpdateAuthor},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
}

fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

impl AuthorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &AuthorQuery) -> AppResult<Vec<Author>> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        self.repository.authors.list(search).await
    }

    /// Author with their books, newest first
    pub async fn get(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self
            .repository
            .authors
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))?;
        let books = self
            .repository
            .books
            .filter(&BookFilter::by_author(id), None)
            .await?;

        Ok(AuthorDetails {
            full_name: author.full_name(),
            author,
            books,
        })
    }

    pub async fn create(&self, mut data: CreateAuthor) -> AppResult<Author> {
        data.name = trimmed(&data.name);
        data.surname = trimmed(&data.surname);
        data.validate()?;

        let author = self.repository.authors.insert(&data).await?;
        tracing::info!("Created author id={}", author.id);
        Ok(author)
    }

    pub async fn update(&self, id: i32, mut data: UpdateAuthor) -> AppResult<Author> {
        data.name = data.name.as_deref().map(trimmed);
        data.surname = data.surname.as_deref().map(trimmed);
        data.validate()?;

        let author = self.repository.authors.update(id, &data).await?;
        tracing::info!("Updated author id={}", author.id);
        Ok(author)
    }

    /// Fails with `Protected` while any book references the author
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!("Deleted author id={}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{book::CreateBook, genre::CreateGenre};
    use chrono::NaiveDate;
    use tokio_test::{assert_err, assert_ok};

    fn author(name: &str, surname: &str) -> CreateAuthor {
        CreateAuthor {
            name: name.to_string(),
            surname: surname.to_string(),
            birth_date: None,
        }
    }

    #[tokio::test]
    async fn test_get_includes_full_name_and_books() {
        let repository = Repository::in_memory();
        let service = AuthorsService::new(repository.clone());
        let pushkin = service.create(author(" Александр ", "Пушкин")).await.unwrap();
        let genre = repository
            .genres
            .insert(&CreateGenre {
                name: "Поэма".to_string(),
                slug: "poem".to_string(),
            })
            .await
            .unwrap();

        for title in ["Руслан и Людмила", "Дубровский"] {
            repository
                .insert_book(CreateBook {
                    title: title.to_string(),
                    slug: None,
                    description: String::new(),
                    author_id: pushkin.id,
                    genre_id: genre.id,
                    quantity: 250,
                    is_read: false,
                })
                .await
                .unwrap();
        }

        let details = service.get(pushkin.id).await.unwrap();
        assert_eq!(details.full_name, "Александр Пушкин");
        assert_eq!(details.books.len(), 2);
        assert_eq!(details.books[0].title, "Дубровский");

        let err = assert_err!(service.delete(pushkin.id).await);
        assert!(matches!(err, AppError::Protected(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_or_clears_birth_date() {
        let service = AuthorsService::new(Repository::in_memory());
        let born = NaiveDate::from_ymd_opt(1828, 9, 9);
        let tolstoy = service
            .create(CreateAuthor {
                birth_date: born,
                ..author("Лев", "Толстой")
            })
            .await
            .unwrap();

        let renamed = service
            .update(
                tolstoy.id,
                UpdateAuthor {
                    name: Some("Лев Николаевич".to_string()),
                    ..UpdateAuthor::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Лев Николаевич");
        assert_eq!(renamed.birth_date, born);

        let cleared = service
            .update(
                tolstoy.id,
                UpdateAuthor {
                    birth_date: Some(None),
                    ..UpdateAuthor::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.birth_date, None);
        assert_eq!(cleared.name, "Лев Николаевич");
    }

    #[tokio::test]
    async fn test_blank_names_are_rejected() {
        let service = AuthorsService::new(Repository::in_memory());
        let err = assert_err!(service.create(author("   ", "Кинг")).await);
        assert!(matches!(err, AppError::InvalidFields(ref f) if f.contains_key("name")));
    }

    #[tokio::test]
    async fn test_search_and_delete() {
        let service = AuthorsService::new(Repository::in_memory());
        let king = service.create(author("Стивен", "Кинг")).await.unwrap();
        service.create(author("Лев", "Толстой")).await.unwrap();

        let found = service
            .list(&AuthorQuery {
                search: Some("кин".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(found, vec![king.clone()]);

        assert_ok!(service.delete(king.id).await);
        let err = assert_err!(service.get(king.id).await);
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
