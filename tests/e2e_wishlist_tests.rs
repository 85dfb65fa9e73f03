//! End-to-end tests for the wishlist.

mod common;

use common::{TestClient, TestServer, TEST_USER};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn add_item(client: &TestClient, item: Value) -> i64 {
    let response = client.add_wishlist_item(item).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_wishlist_is_ordered_by_priority_then_title() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server).await;

    add_item(&client, json!({"title": "Zodiac", "priority": "Low"})).await;
    add_item(&client, json!({"title": "Memento"})).await;
    add_item(&client, json!({"title": "Tenet", "priority": "High"})).await;
    add_item(&client, json!({"title": "Arrival", "priority": "High"})).await;

    let items: Vec<Value> = client.get_wishlist().await.json().await.unwrap();
    let order: Vec<(&str, &str)> = items
        .iter()
        .map(|i| (i["title"].as_str().unwrap(), i["priority"].as_str().unwrap()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("Arrival", "High"),
            ("Tenet", "High"),
            ("Memento", "Medium"),
            ("Zodiac", "Low"),
        ]
    );
}

#[tokio::test]
async fn test_wishlist_item_requires_title() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server).await;

    let response = client.add_wishlist_item(json!({"year": 2024})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_wishlist_item() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server).await;
    let id = add_item(&client, json!({"title": "Dune"})).await;

    assert_eq!(client.delete_wishlist_item(id).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(client.delete_wishlist_item(id).await.status(), StatusCode::NOT_FOUND);

    let items: Vec<Value> = client.get_wishlist().await.json().await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_move_item_into_collection() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server).await;
    let id = add_item(
        &client,
        json!({"title": "Dune", "year": 2021, "genre": "Sci-Fi", "priority": "High"}),
    )
    .await;

    let response = client.move_wishlist_item(id).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let moved: Value = response.json().await.unwrap();
    let movie_id = moved["movie_id"].as_i64().unwrap();
    assert_eq!(moved["item"]["title"], "Dune");

    let items: Vec<Value> = client.get_wishlist().await.json().await.unwrap();
    assert!(items.is_empty());

    let movie: Value = client.get_movie(movie_id).await.json().await.unwrap();
    assert_eq!(movie["title"], "Dune");
    assert_eq!(movie["year"], 2021);
    assert_eq!(movie["genre"], "Sci-Fi");
    assert_eq!(movie["rating"], 0.0);
    assert_eq!(movie["is_ripped"], false);
    assert_eq!(movie["is_locked"], false);

    let admin = TestClient::authenticated_admin(&server).await;
    let entries: Vec<Value> = admin.get_audit(None).await.json().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "ADDED_FROM_WISHLIST");
    assert_eq!(entries[0]["actor"], TEST_USER);
    assert_eq!(entries[0]["subject"], "Dune");
    assert_eq!(entries[0]["details"], "Moved from Wishlist");

    // Clearing the placeholder rating is not a change.
    let response = client
        .update_movie(
            movie_id,
            json!({"title": "Dune", "year": 2021, "genre": "Sci-Fi"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let entries: Vec<Value> = admin.get_audit(None).await.json().await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_move_missing_item() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server).await;

    assert_eq!(client.move_wishlist_item(99).await.status(), StatusCode::NOT_FOUND);

    let movies: Value = client.list_movies(&[]).await.json().await.unwrap();
    assert!(movies["movies"].as_array().unwrap().is_empty());
}
