//! Data models for the catalog

pub mod author;
pub mod book;
pub mod genre;

// Re-export commonly used types
pub use author::{Author, AuthorDetails};
pub use book::{Book, BookDetails, BookPage, NewBook};
pub use genre::Genre;
