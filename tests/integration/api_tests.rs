//! API integration tests against the in-memory store

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use catalog_server::{api, repository::Repository, AppConfig, AppState};

fn app() -> Router {
    api::router(AppState::new(AppConfig::default(), Repository::in_memory()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(format!("/api/v1{}", uri));
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to send request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Failed to parse response")
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

async fn create_author(app: &Router, name: &str, surname: &str) -> i64 {
    let (status, body) = post(app, "/authors", json!({ "name": name, "surname": surname })).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().expect("No author id")
}

async fn create_genre(app: &Router, name: &str, slug: &str) -> i64 {
    let (status, body) = post(app, "/genres", json!({ "name": name, "slug": slug })).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().expect("No genre id")
}

struct Catalog {
    app: Router,
    pushkin: i64,
    slugs: Vec<String>,
}

/// Three authors, three genres and six books created in order
async fn seeded() -> Catalog {
    let app = app();
    let king = create_author(&app, "Стивен", "Кинг").await;
    let tolstoy = create_author(&app, "Лев", "Толстой").await;
    let pushkin = create_author(&app, "Александр", "Пушкин").await;
    let fantasy = create_genre(&app, "Фантастика", "fantasy").await;
    let novel = create_genre(&app, "Роман", "novel").await;
    let poem = create_genre(&app, "Поэма", "poem").await;

    let books = [
        ("Туман", king, fantasy, 100, false),
        ("Война и Мир", tolstoy, novel, 1000, true),
        ("Руслан и Людмила", pushkin, poem, 250, false),
        ("Сияние", king, fantasy, 370, true),
        ("Оно", king, fantasy, 560, true),
        ("Дубровский", pushkin, novel, 250, false),
    ];
    let mut slugs = Vec::new();
    for (title, author_id, genre_id, quantity, is_read) in books {
        let (status, body) = post(
            &app,
            "/books",
            json!({
                "title": title,
                "description": "Description",
                "author_id": author_id,
                "genre_id": genre_id,
                "quantity": quantity,
                "is_read": is_read
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        slugs.push(body["slug"].as_str().expect("No slug").to_string());
    }

    Catalog { app, pushkin, slugs }
}

fn titles(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .expect("No items")
        .iter()
        .map(|b| b["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = app();

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get(&app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_list_pages_newest_first() {
    let catalog = seeded().await;

    let (status, first) = get(&catalog.app, "/books").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        titles(&first),
        vec!["Дубровский", "Оно", "Сияние", "Руслан и Людмила", "Война и Мир"]
    );
    assert_eq!(first["total"], 6);
    assert_eq!(first["per_page"], 5);
    assert_eq!(first["total_pages"], 2);

    let (status, second) = get(&catalog.app, "/books?page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&second), vec!["Туман"]);

    let (_, last) = get(&catalog.app, "/books?page=last").await;
    assert_eq!(last["page"], 2);
    assert_eq!(titles(&last), vec!["Туман"]);
}

#[tokio::test]
async fn test_out_of_range_page_is_empty() {
    let catalog = seeded().await;
    let (status, body) = get(&catalog.app, "/books?page=9").await;
    assert_eq!(status, StatusCode::OK);
    assert!(titles(&body).is_empty());
}

#[tokio::test]
async fn test_first_page_without_matches() {
    let catalog = seeded().await;
    let (status, body) = get(&catalog.app, "/books?genre=poetry").await;
    assert_eq!(status, StatusCode::OK);
    assert!(titles(&body).is_empty());
    assert_eq!(body["total"], 0);
    assert_eq!(body["total_pages"], 1);
}

#[tokio::test]
async fn test_filters_combine() {
    let catalog = seeded().await;

    let (_, body) = get(&catalog.app, "/books?genre=fantasy&read=false").await;
    assert_eq!(titles(&body), vec!["Туман"]);

    let (_, body) = get(&catalog.app, "/books?genre=fantasy&read=true").await;
    assert_eq!(titles(&body), vec!["Оно", "Сияние"]);

    let uri = format!("/books?author={}&genre=novel", catalog.pushkin);
    let (_, body) = get(&catalog.app, &uri).await;
    assert_eq!(titles(&body), vec!["Дубровский"]);
}

#[tokio::test]
async fn test_malformed_filters_are_ignored() {
    let catalog = seeded().await;

    let (status, body) = get(&catalog.app, "/books?read=maybe").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 6);

    let (status, body) = get(&catalog.app, "/books?author=abc&genre=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 6);
}

#[tokio::test]
async fn test_books_with_same_title_get_distinct_slugs() {
    let catalog = seeded().await;
    let original = &catalog.slugs[1];

    let (_, book) = get(&catalog.app, &format!("/books/{}", original)).await;
    let (status, copy) = post(
        &catalog.app,
        "/books",
        json!({
            "title": "Война и Мир",
            "author_id": book["author"]["id"],
            "genre_id": book["genre"]["id"],
            "quantity": 1200
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(copy["slug"], book["slug"]);
    assert_eq!(copy["is_read"], false);
    assert_eq!(copy["description"], "");
}

#[tokio::test]
async fn test_supplied_slug_is_kept_and_must_be_free() {
    let catalog = seeded().await;
    let (_, book) = get(&catalog.app, &format!("/books/{}", catalog.slugs[0])).await;
    let draft = json!({
        "title": "The Mist",
        "slug": "the-mist",
        "author_id": book["author"]["id"],
        "genre_id": book["genre"]["id"],
        "quantity": 230
    });

    let (status, created) = post(&catalog.app, "/books", draft.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "the-mist");

    let (status, body) = post(&catalog.app, "/books", draft).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Duplicate");
}

#[tokio::test]
async fn test_invalid_book_is_rejected_with_fields() {
    let catalog = seeded().await;
    let (status, body) = post(
        &catalog.app,
        "/books",
        json!({
            "title": "   ",
            "author_id": catalog.pushkin,
            "genre_id": 999,
            "quantity": 0
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
    assert!(body["fields"].is_object());
}

#[tokio::test]
async fn test_unknown_book_is_not_found() {
    let catalog = seeded().await;
    let (status, body) = get(&catalog.app, "/books/no-such-book").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchRecord");
}

#[tokio::test]
async fn test_update_keeps_slug() {
    let catalog = seeded().await;
    let slug = &catalog.slugs[0];

    let (status, body) = send(
        &catalog.app,
        Method::PUT,
        &format!("/books/{}", slug),
        Some(json!({ "title": "Мгла", "quantity": 230 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Мгла");
    assert_eq!(body["quantity"], 230);
    assert_eq!(body["slug"], slug.as_str());
}

#[tokio::test]
async fn test_update_with_unknown_references_is_rejected() {
    let catalog = seeded().await;
    let uri = format!("/books/{}", catalog.slugs[0]);

    let (status, body) = send(&catalog.app, Method::PUT, &uri, Some(json!({ "author_id": 999 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["author_id"].is_array());

    let (status, body) = send(&catalog.app, Method::PUT, &uri, Some(json!({ "genre_id": 999 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["genre_id"].is_array());

    let (_, book) = get(&catalog.app, &uri).await;
    assert_eq!(book["genre"]["slug"], "fantasy");
}

#[tokio::test]
async fn test_author_birth_date_can_be_cleared() {
    let app = app();
    let (status, author) = post(
        &app,
        "/authors",
        json!({ "name": "Лев", "surname": "Толстой", "birth_date": "1828-09-09" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/authors/{}", author["id"]);

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "surname": "Толстой-Юрьев" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["birth_date"], "1828-09-09");

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "birth_date": null }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["birth_date"].is_null());
    assert_eq!(body["surname"], "Толстой-Юрьев");
}

#[tokio::test]
async fn test_toggle_read_twice() {
    let catalog = seeded().await;
    let uri = format!("/books/{}/toggle-read", catalog.slugs[0]);

    let (status, body) = send(&catalog.app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_read"], true);

    let (_, body) = send(&catalog.app, Method::POST, &uri, None).await;
    assert_eq!(body["is_read"], false);
}

#[tokio::test]
async fn test_author_details_and_protected_delete() {
    let catalog = seeded().await;
    let uri = format!("/authors/{}", catalog.pushkin);

    let (status, body) = get(&catalog.app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["full_name"], "Александр Пушкин");
    assert_eq!(titles(&json!({ "items": body["books"] })), vec!["Дубровский", "Руслан и Людмила"]);

    let (status, body) = send(&catalog.app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "StillReferenced");
}

#[tokio::test]
async fn test_delete_book_then_author() {
    let app = app();
    let author = create_author(&app, "Лев", "Толстой").await;
    let genre = create_genre(&app, "Роман", "novel").await;
    let (_, book) = post(
        &app,
        "/books",
        json!({ "title": "Анна Каренина", "author_id": author, "genre_id": genre, "quantity": 864 }),
    )
    .await;
    let slug = book["slug"].as_str().expect("No slug");

    let (status, _) = send(&app, Method::DELETE, &format!("/books/{}", slug), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::DELETE, &format!("/authors/{}", author), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::DELETE, &format!("/genres/{}", genre), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
}
