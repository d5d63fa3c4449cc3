use axum::body::Body;
use axum::http::{Request, StatusCode};
use catalog_server::catalog::{SqliteCatalog, fixtures};
use catalog_server::db::DbService;
use catalog_server::{Config, Server, ServerState};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

async fn app() -> axum::Router {
    let db = DbService::in_memory().await.unwrap();
    fixtures::seed_sqlite(&db.pool).await.unwrap();
    let state = ServerState::new(
        Config::with_overrides("./target/test-data", 0),
        Arc::new(SqliteCatalog::new(db.pool)),
    )
    .unwrap();
    Server::router(state)
}

async fn get_text(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn names(body: &Value) -> Vec<(String, Value)> {
    body["data"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| (row["name"].as_str().unwrap().to_string(), row["linkType"].clone()))
        .collect()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(app().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get(app().await, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["store"]["status"], "ok");
}

#[tokio::test]
async fn test_tree_without_counts() {
    let (status, body) = get(app().await, "/api/categories/tree").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);

    let root = &body["data"][0];
    assert_eq!(root["name"], "Electronics");
    assert_eq!(root["parentId"], Value::Null);
    assert!(root.get("attributeCount").is_none());
    assert_eq!(root["children"][0]["name"], "Mobile Phones");
    assert_eq!(root["children"][1]["children"][0]["name"], "Gaming Laptops");
}

#[tokio::test]
async fn test_tree_with_counts() {
    let (status, body) = get(app().await, "/api/categories/tree?includeCounts=true").await;
    assert_eq!(status, StatusCode::OK);

    let root = &body["data"][0];
    assert_eq!(root["attributeCount"], 2);
    assert_eq!(root["productCount"], 4);
    let phones = &root["children"][0];
    assert_eq!(phones["attributeCount"], 3);
    assert_eq!(phones["productCount"], 2);
    let iphones = &phones["children"][1];
    assert_eq!(iphones["name"], "iPhones");
    assert_eq!(iphones["attributeCount"], 0);
    assert_eq!(iphones["productCount"], 1);
}

#[tokio::test]
async fn test_iphones_attributes() {
    let (status, body) = get(app().await, "/api/attributes?categoryIds=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 6);
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["limit"], 20);
    assert_eq!(body["data"]["totalPages"], 1);

    let rows = names(&body);
    assert_eq!(rows[1], ("Brand".to_string(), json!("global")));
    assert_eq!(rows[3], ("Model".to_string(), json!("inherited")));
    assert_eq!(rows[4], ("OS Version".to_string(), json!("inherited")));
    assert!(!rows.iter().any(|(name, _)| name == "GPU Model"));
}

#[tokio::test]
async fn test_iphones_not_applicable() {
    let (status, body) =
        get(app().await, "/api/attributes?categoryIds=5&notApplicable=true").await;
    assert_eq!(status, StatusCode::OK);

    let rows = names(&body);
    assert_eq!(rows.len(), 4);
    assert!(rows.contains(&("GPU Model".to_string(), Value::Null)));
    assert!(rows.iter().all(|(_, link)| link.is_null()));
    assert_eq!(body["data"]["data"][0]["type"], "SHORTTEXT");
}

#[tokio::test]
async fn test_link_types_and_keyword() {
    let (status, body) = get(
        app().await,
        "/api/attributes?categoryIds=5,6&linkTypes=direct,global&keyword=%20gpu",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec![("GPU Model".to_string(), json!("direct"))]);
}

#[tokio::test]
async fn test_repeated_list_keys() {
    let (status, repeated) = get(
        app().await,
        "/api/attributes?categoryIds=5&categoryIds=6&linkTypes=direct&linkTypes=global",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, commas) = get(
        app().await,
        "/api/attributes?categoryIds=5,6&linkTypes=direct,global",
    )
    .await;
    assert_eq!(repeated["data"], commas["data"]);
    assert_eq!(
        names(&repeated),
        vec![
            ("Brand".to_string(), json!("global")),
            ("GPU Model".to_string(), json!("direct")),
        ]
    );

    let (status, body) = get(
        app().await,
        "/api/attributes?categoryIds=1&linkTypes=direct&linkTypes=inherited",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert!(names(&body).iter().all(|(_, link)| link == "direct"));

    let (status, body) = get(app().await, "/api/attributes?categoryIds=6&categoryIds=5,6").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 10);
}

#[tokio::test]
async fn test_blank_link_types_need_categories() {
    let (status, body) = get(app().await, "/api/attributes?linkTypes=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "linkTypes require at least one categoryId");

    let (status, body) = get(app().await, "/api/attributes?categoryIds=5&linkTypes=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 6);
}

#[tokio::test]
async fn test_category_id_list_is_capped() {
    let ids: Vec<String> = (1..=101).map(|id| id.to_string()).collect();
    let uri = format!("/api/attributes?categoryIds={}", ids.join(","));
    let (status, body) = get(app().await, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "categoryIds accepts at most 100 ids, got 101");

    let uri = format!("/api/attributes?categoryIds={}", ids[..100].join(","));
    let (status, body) = get(app().await, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid categoryIds: 8, 9"));
}

#[tokio::test]
async fn test_metrics_count_requests_by_route() {
    let app = app().await;
    get(app.clone(), "/api/attributes?categoryIds=5").await;
    get(app.clone(), "/api/attributes?categoryIds=6").await;
    get(app.clone(), "/api/attributes?page=0").await;

    let (status, text) = get_text(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains(
        r#"http_requests_total{method="GET",route="/api/attributes",status_code="200"} 2"#
    ));
    assert!(text.contains(
        r#"http_requests_total{method="GET",route="/api/attributes",status_code="400"} 1"#
    ));
    assert!(text.contains("# TYPE http_request_duration_seconds histogram"));
}

#[tokio::test]
async fn test_sort_and_paginate() {
    let (status, body) = get(
        app().await,
        "/api/attributes?sortBy=createdAt&sortOrder=desc&page=2&limit=4",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 10);
    assert_eq!(body["data"]["totalPages"], 3);
    let ids: Vec<i64> = body["data"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![6, 5, 4, 3]);

    let (_, body) = get(app().await, "/api/attributes?page=9&limit=5").await;
    assert_eq!(body["data"]["data"], json!([]));
    assert_eq!(body["data"]["total"], 10);
}

#[tokio::test]
async fn test_usage_errors_are_bad_requests() {
    let cases = [
        "/api/attributes?linkTypes=direct",
        "/api/attributes?notApplicable=true",
        "/api/attributes?categoryIds=5&linkTypes=direct,inherited,global&notApplicable=true",
        "/api/attributes?sortBy=password",
        "/api/attributes?sortOrder=sideways",
        "/api/attributes?linkTypes=indirect&categoryIds=5",
        "/api/attributes?categoryIds=five",
        "/api/attributes?limit=201",
        "/api/attributes?page=0",
        "/api/attributes?limit=abc",
    ];
    for uri in cases {
        let (status, body) = get(app().await, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_ne!(body["code"], 0, "{uri}");
    }

    let (status, _) = get(app().await, "/api/attributes?limit=200").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_categories_are_named() {
    let (status, body) = get(app().await, "/api/attributes?categoryIds=99,5,100").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid categoryIds: 99, 100");
}

#[tokio::test]
async fn test_file_database_with_demo_seed() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::with_overrides(dir.path().to_string_lossy(), 0);
    config.seed_demo_data = true;

    let state = ServerState::initialize(&config).await.unwrap();
    assert!(dir.path().join("catalog.db").exists());

    let (status, body) = get(Server::router(state), "/api/attributes?categoryIds=6").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 7);

    // Re-opening keeps the data and skips the seed
    let state = ServerState::initialize(&config).await.unwrap();
    let (_, body) = get(Server::router(state), "/api/categories/tree").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
