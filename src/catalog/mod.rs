//! Catalog rules independent of storage and HTTP: listing filters,
//! pagination, and slug assignment for new books.

pub mod filter;
pub mod normalizer;
pub mod pagination;
pub mod slug;

pub use filter::BookFilter;
pub use normalizer::prepare_for_create;
pub use pagination::{PageRequest, PageWindow, Pagination};
