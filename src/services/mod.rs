//! Business logic services

pub mod authors;
pub mod catalog;
pub mod genres;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub authors: authors::AuthorsService,
    pub genres: genres::GenresService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, page_size: i64) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), page_size),
            authors: authors::AuthorsService::new(repository.clone()),
            genres: genres::GenresService::new(repository),
        }
    }
}
