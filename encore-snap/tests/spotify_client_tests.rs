//! SpotifyClient tests against a local fake of the accounts and Web API

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use encore_common::config::SpotifyCredentials;
use encore_snap::services::{MetricsProvider, SpotifyClient, SpotifyError};
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Behaviour switches and counters for the fake server
#[derive(Default)]
struct FakeSpotify {
    token_requests: AtomicUsize,
    artist_requests: AtomicUsize,
    /// Number of artist requests to answer with 401 before succeeding
    reject_first: AtomicUsize,
    rate_limited: bool,
}

#[derive(Deserialize)]
struct ArtistsQuery {
    ids: String,
}

async fn token(State(fake): State<Arc<FakeSpotify>>) -> Json<serde_json::Value> {
    let n = fake.token_requests.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({
        "access_token": format!("token-{}", n),
        "token_type": "Bearer",
        "expires_in": 3600
    }))
}

async fn artists(
    State(fake): State<Arc<FakeSpotify>>,
    headers: HeaderMap,
    Query(query): Query<ArtistsQuery>,
) -> Response {
    fake.artist_requests.fetch_add(1, Ordering::SeqCst);

    if fake.rate_limited {
        return (StatusCode::TOO_MANY_REQUESTS, [("retry-after", "7")], "slow down").into_response();
    }

    let pending_rejections = fake.reject_first.load(Ordering::SeqCst);
    if pending_rejections > 0 {
        fake.reject_first.store(pending_rejections - 1, Ordering::SeqCst);
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.starts_with("Bearer token-"));
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let body: Vec<serde_json::Value> = query
        .ids
        .split(',')
        .map(|id| {
            if id.starts_with("missing") {
                serde_json::Value::Null
            } else {
                json!({
                    "id": id,
                    "name": format!("Name of {}", id),
                    "popularity": 42,
                    "followers": { "href": null, "total": 1234 },
                    "genres": ["pop"],
                    "images": [{ "url": format!("https://img.test/{}", id) }]
                })
            }
        })
        .collect();

    Json(json!({ "artists": body })).into_response()
}

/// Start the fake on an ephemeral port and return a client pointed at it
async fn start_fake(fake: Arc<FakeSpotify>) -> SpotifyClient {
    let app = Router::new()
        .route("/api/token", post(token))
        .route("/v1/artists", get(artists))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let credentials = SpotifyCredentials {
        client_id: "test-id".to_string(),
        client_secret: "test-secret".to_string(),
    };
    SpotifyClient::with_base_urls(
        credentials,
        &format!("http://{}", addr),
        &format!("http://{}/v1", addr),
    )
    .unwrap()
}

fn ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("artist{:02}", i)).collect()
}

#[tokio::test]
async fn test_fetch_maps_artists_and_drops_unknown() {
    let fake = Arc::new(FakeSpotify::default());
    let client = start_fake(fake.clone()).await;

    let requested = vec!["artist01".to_string(), "missing01".to_string()];
    let metrics = client.fetch_artists(&requested).await.unwrap();

    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].spotify_id, "artist01");
    assert_eq!(metrics[0].popularity, 42);
    assert_eq!(metrics[0].followers, 1234);
    assert_eq!(metrics[0].image_url.as_deref(), Some("https://img.test/artist01"));
}

#[tokio::test]
async fn test_batches_of_fifty_share_one_token() {
    let fake = Arc::new(FakeSpotify::default());
    let client = start_fake(fake.clone()).await;

    let metrics = client.fetch_artists(&ids(120)).await.unwrap();

    assert_eq!(metrics.len(), 120);
    assert_eq!(fake.artist_requests.load(Ordering::SeqCst), 3);
    assert_eq!(fake.token_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_once() {
    let fake = Arc::new(FakeSpotify::default());
    fake.reject_first.store(1, Ordering::SeqCst);
    let client = start_fake(fake.clone()).await;

    let metrics = client.fetch_artists(&ids(2)).await.unwrap();

    assert_eq!(metrics.len(), 2);
    assert_eq!(fake.token_requests.load(Ordering::SeqCst), 2);
    assert_eq!(fake.artist_requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_repeated_rejection_is_auth_error() {
    let fake = Arc::new(FakeSpotify::default());
    fake.reject_first.store(5, Ordering::SeqCst);
    let client = start_fake(fake.clone()).await;

    let err = client.fetch_artists(&ids(1)).await.unwrap_err();

    assert!(matches!(err, SpotifyError::AuthError(_)));
    assert_eq!(fake.artist_requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let fake = Arc::new(FakeSpotify {
        rate_limited: true,
        ..FakeSpotify::default()
    });
    let client = start_fake(fake).await;

    let err = client.fetch_artists(&ids(1)).await.unwrap_err();

    match err {
        SpotifyError::RateLimitExceeded { retry_after_secs } => {
            assert_eq!(retry_after_secs, Some(7));
        }
        other => panic!("expected rate limit error, got {:?}", other),
    }
}
