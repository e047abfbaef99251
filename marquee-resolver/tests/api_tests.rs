//! HTTP API integration tests
//!
//! Drives the full router with tower's oneshot against an in-memory
//! catalog and a scripted provider.

mod helpers;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use helpers::{make_resolver, scripted_provider, setup_pool};
use marquee_resolver::{build_router, AppState};

async fn test_app() -> Router {
    let pool = setup_pool().await;
    let provider = Arc::new(scripted_provider());
    let resolver = Arc::new(make_resolver(pool.clone(), provider));
    build_router(AppState::new(pool, resolver))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "marquee-resolver");
    assert!(json["uptime_seconds"].is_number());
}

#[tokio::test]
async fn test_add_movie_via_link() {
    let app = test_app().await;

    let response = app
        .oneshot(post_json(
            "/guilds/g1/movies",
            json!({"user": "alice", "query": "https://www.imdb.com/title/tt0114709"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["movie_name"], "Toy Story (1995)");
    assert_eq!(json["imdb_url"], "https://www.imdb.com/title/tt0114709");
}

#[tokio::test]
async fn test_add_then_list_movies() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/guilds/g1/movies",
            json!({"user": "alice", "query": "alien"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/guilds/g1/movies")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["movies"], json!(["alien"]));
}

#[tokio::test]
async fn test_list_with_runtime_filter() {
    let app = test_app().await;

    // alien resolves to 117 min, tt0114709 to 81 min
    for query in ["alien", "https://www.imdb.com/title/tt0114709"] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/guilds/g1/movies",
                json!({"user": "alice", "query": query}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(get("/guilds/g1/movies?max_runtime=90"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["movies"], json!(["Toy Story (1995)"]));
}

#[tokio::test]
async fn test_search_movies() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/guilds/g1/movies",
            json!({"user": "alice", "query": "alien"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/guilds/g1/movies/search?q=LIE"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["movies"], json!(["alien"]));
}

#[tokio::test]
async fn test_pick_from_empty_catalog_is_404() {
    let app = test_app().await;

    let response = app.oneshot(get("/guilds/g1/pick")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_pick_returns_name_and_link() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/guilds/g1/movies",
            json!({"user": "alice", "query": "alien"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/guilds/g1/pick")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["movie_name"], "alien");
    assert_eq!(json["imdb_url"], "https://www.imdb.com/title/tt0078748");
}

#[tokio::test]
async fn test_remove_missing_movie_is_404() {
    let app = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/guilds/g1/movies/nothing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_movie() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/guilds/g1/movies",
            json!({"user": "alice", "query": "alien"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/guilds/g1/movies/alien")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["removed"], "alien");

    let response = app.oneshot(get("/guilds/g1/movies")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["movies"], json!([]));
}

#[tokio::test]
async fn test_correction_without_session_is_400() {
    let app = test_app().await;

    let response = app
        .oneshot(post_json(
            "/guilds/g1/corrections",
            json!({"user": "alice", "option": null}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_correction_candidate_listing() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/guilds/g1/movies",
            json!({"user": "alice", "query": "alien"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_json(
            "/guilds/g1/corrections",
            json!({"user": "alice", "option": null}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["kind"], "candidates");
    let candidates = json["candidates"].as_array().unwrap();
    assert_eq!(candidates.len(), 5);
    assert_eq!(candidates[0]["rank"], 0);
    assert_eq!(candidates[0]["title"], "Alien");
    assert_eq!(
        candidates[0]["imdb_url"],
        "https://www.imdb.com/title/tt0078748"
    );
}

#[tokio::test]
async fn test_correction_replacement() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/guilds/g1/movies",
            json!({"user": "alice", "query": "alien"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(
            "/guilds/g1/corrections",
            json!({"user": "alice", "option": "1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["kind"], "replacement");
    assert_eq!(json["replacement"]["old_title"], "alien");
    assert_eq!(json["replacement"]["new_title"], "Aliens (1986)");

    let response = app.oneshot(get("/guilds/g1/movies")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["movies"], json!(["Aliens (1986)"]));
}

#[tokio::test]
async fn test_correction_out_of_range_is_400() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/guilds/g1/movies",
            json!({"user": "alice", "query": "alien"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_json(
            "/guilds/g1/corrections",
            json!({"user": "alice", "option": "99"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_link_and_runtime_endpoints() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/guilds/g1/movies",
            json!({"user": "alice", "query": "alien"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/guilds/g1/link?movie=alien"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["imdb_url"], "https://www.imdb.com/title/tt0078748");

    // Omitted movie parameter falls back to the last mentioned
    let response = app.oneshot(get("/guilds/g1/runtime")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["runtime_minutes"], 117);
}

#[tokio::test]
async fn test_failed_add_surfaces_in_health() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/guilds/g1/movies",
            json!({"user": "alice", "query": "no such movie"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["last_error"].as_str().unwrap().contains("no such movie"));
}

#[tokio::test]
async fn test_guilds_are_isolated() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/guilds/g1/movies",
            json!({"user": "alice", "query": "alien"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/guilds/g2/movies")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["movies"], json!([]));
}
