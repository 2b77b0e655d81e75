//! Personal library catalog
//!
//! A REST JSON API over books, authors and genres. Books are listed newest
//! first, filtered by genre, author and read flag, five to a page, and get a
//! unique URL slug derived from their title when they are created.

use std::sync::Arc;

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: AppConfig, repository: repository::Repository) -> Self {
        let services = services::Services::new(repository, config.catalog.page_size);
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
