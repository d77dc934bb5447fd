//! Router-level tests. The pool is constructed lazily and never connects,
//! so these cover everything that resolves before a storage round trip:
//! routing, body rejection, input validation, CORS and the health endpoint.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use banking_api::config::DbConfig;
use banking_api::db::DbConnection;
use banking_api::rest::{router, AppState};

fn test_router() -> Router {
    let config = DbConfig {
        host: "localhost".to_string(),
        user: "nobody".to_string(),
        password: String::new(),
        database: "unused".to_string(),
        port: 5432,
    };
    router(AppState::new(DbConnection::connect_lazy(&config)))
}

fn json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

#[tokio::test]
async fn health_reports_healthy_without_storage() {
    let response = test_router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body, serde_json::json!({"status": "healthy"}));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let response = test_router()
        .oneshot(Request::get("/balances").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_account_body_is_rejected_without_mutation() {
    let response = test_router()
        .oneshot(json_request(Method::POST, "/accounts/", "{not json"))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn wrong_shape_account_body_is_rejected() {
    let response = test_router()
        .oneshot(json_request(
            Method::POST,
            "/accounts/",
            r#"{"balance":"a lot"}"#,
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn transaction_against_non_numeric_account_is_bad_request() {
    let response = test_router()
        .oneshot(json_request(
            Method::POST,
            "/transactions/",
            r#"{"account_id":"abc","amount":5.0,"type":"deposit"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "Account not found");
}

#[tokio::test]
async fn unrecognized_status_update_is_bad_request() {
    let response = test_router()
        .oneshot(json_request(
            Method::PUT,
            "/transactions/5",
            r#"{"status":"refunded"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("refunded"));
}

#[tokio::test]
async fn fetching_non_numeric_account_id_is_not_found() {
    let response = test_router()
        .oneshot(Request::get("/accounts/abc").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "Account not found");
}

#[tokio::test]
async fn updating_non_numeric_account_id_is_bad_request() {
    let response = test_router()
        .oneshot(json_request(
            Method::PUT,
            "/accounts/abc",
            r#"{"balance":10.0}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let response = test_router()
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap()),
        Some("*")
    );
}
