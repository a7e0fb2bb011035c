use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use polarity_ledger::{ApiClient, ClientError, LoginCredentials};

const FRESH_TOKEN: &str = "fresh";

/// A stand-in for the backend that only knows the auth endpoints and the
/// category list, and counts how often each is hit
#[derive(Default)]
struct Backend {
    refresh_works: bool,
    logins: AtomicUsize,
    refreshes: AtomicUsize,
    category_requests: AtomicUsize,
}

type Reply = (StatusCode, Json<Value>);

async fn login(State(backend): State<Arc<Backend>>) -> Reply {
    backend.logins.fetch_add(1, Ordering::SeqCst);
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid credentials"})))
}

async fn refresh(State(backend): State<Arc<Backend>>) -> Reply {
    backend.refreshes.fetch_add(1, Ordering::SeqCst);
    match backend.refresh_works {
        true => (StatusCode::OK, Json(json!({"access_token": FRESH_TOKEN}))),
        false => (StatusCode::UNAUTHORIZED, Json(json!({"error": "Refresh token expired"}))),
    }
}

async fn categories(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Reply {
    backend.category_requests.fetch_add(1, Ordering::SeqCst);

    let bearer = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    match bearer == Some(&format!("Bearer {FRESH_TOKEN}")[..]) {
        true => (StatusCode::OK, Json(json!({"categories": ["Food", "Rent"]}))),
        false => (StatusCode::UNAUTHORIZED, Json(json!({"error": "Token has expired"}))),
    }
}

/// Serves the backend on a free port and returns its address
async fn spawn_backend(refresh_works: bool) -> (String, Arc<Backend>) {
    let backend = Arc::new(Backend { refresh_works, ..Default::default() });
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/transactions/categories", get(categories))
        .with_state(backend.clone());

    // OS assigns the port if binding to 0
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (address, backend)
}

#[tokio::test]
async fn rejected_token_is_refreshed_and_retried_once() -> anyhow::Result<()> {
    let (address, backend) = spawn_backend(true).await;
    let client = ApiClient::new(address)?.with_token("stale");

    let categories = client.get_categories().await?;

    assert_eq!(categories.categories, ["Food", "Rent"]);
    assert_eq!(client.token().as_deref(), Some(FRESH_TOKEN));
    assert_eq!(backend.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(backend.category_requests.load(Ordering::SeqCst), 2);

    Ok(())
}

#[tokio::test]
async fn failed_refresh_drops_the_token() -> anyhow::Result<()> {
    let (address, backend) = spawn_backend(false).await;
    let client = ApiClient::new(address)?.with_token("stale");

    match client.get_categories().await {
        Err(ClientError::Api(code, text)) => {
            assert_eq!(code, reqwest::StatusCode::UNAUTHORIZED);
            assert_eq!(text, "Refresh token expired");
        }
        other => panic!("Expected an API error, got {other:?}"),
    }

    assert_eq!(client.token(), None);
    assert_eq!(backend.refreshes.load(Ordering::SeqCst), 1);
    // no retry without a token
    assert_eq!(backend.category_requests.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn rejected_login_is_not_retried() -> anyhow::Result<()> {
    let (address, backend) = spawn_backend(true).await;
    let client = ApiClient::new(address)?;

    let result = client.login(&LoginCredentials::new("alice@example.com", "wrong")).await;

    match result {
        Err(ClientError::Api(code, text)) => {
            assert_eq!(code, reqwest::StatusCode::UNAUTHORIZED);
            assert_eq!(text, "Invalid credentials");
        }
        other => panic!("Expected an API error, got {other:?}"),
    }

    assert_eq!(client.token(), None);
    assert_eq!(backend.logins.load(Ordering::SeqCst), 1);
    assert_eq!(backend.refreshes.load(Ordering::SeqCst), 0);

    Ok(())
}
