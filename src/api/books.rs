//! Book endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::book::{BookDetails, BookPage, BookQuery, CreateBook, UpdateBook},
};

/// List books, newest first, filtered and paginated
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "One page of books", body = BookPage)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<BookPage>> {
    let page = state.services.catalog.list_books(&query).await?;
    Ok(Json(page))
}

/// Get a book by slug
#[utoipa::path(
    get,
    path = "/books/{slug}",
    tag = "books",
    params(("slug" = String, Path, description = "Book slug")),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.catalog.get_book(&slug).await?;
    Ok(Json(book))
}

/// Create a book. The slug is derived from the title when omitted.
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookDetails),
        (status = 400, description = "Invalid fields", body = crate::error::ErrorResponse),
        (status = 409, description = "Slug already taken", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    Json(data): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<BookDetails>)> {
    let book = state.services.catalog.create_book(data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update a book. The slug never changes.
#[utoipa::path(
    put,
    path = "/books/{slug}",
    tag = "books",
    params(("slug" = String, Path, description = "Book slug")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = BookDetails),
        (status = 400, description = "Invalid fields", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    Path(slug): Path<String>,
    Json(data): Json<UpdateBook>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.catalog.update_book(&slug, data).await?;
    Ok(Json(book))
}

/// Flip the read flag
#[utoipa::path(
    post,
    path = "/books/{slug}/toggle-read",
    tag = "books",
    params(("slug" = String, Path, description = "Book slug")),
    responses(
        (status = 200, description = "Book with its new read flag", body = BookDetails),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn toggle_read(
    State(state): State<crate::AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.catalog.toggle_read(&slug).await?;
    Ok(Json(book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{slug}",
    tag = "books",
    params(("slug" = String, Path, description = "Book slug")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_book(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
