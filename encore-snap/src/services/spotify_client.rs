//! Spotify Web API client
//!
//! Fetches artist popularity, follower counts, genres and images using the
//! client-credentials grant. Tokens are cached until shortly before expiry;
//! requests are spaced by a simple rate limiter and batched 50 ids at a time.

use async_trait::async_trait;
use encore_common::config::{is_valid_key, SpotifyCredentials};
use encore_common::db::ArtistMetrics;
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com";
const API_BASE_URL: &str = "https://api.spotify.com/v1";
const USER_AGENT: &str = concat!("Encore/", env!("CARGO_PKG_VERSION"));
const RATE_LIMIT_MS: u64 = 100;
/// Spotify's limit for `GET /artists?ids=`
pub const MAX_IDS_PER_REQUEST: usize = 50;
/// Refresh tokens this long before Spotify says they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Spotify client errors
#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("Spotify configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Spotify authentication failed: {0}")]
    AuthError(String),

    #[error("Spotify rate limit exceeded (retry after {retry_after_secs:?}s)")]
    RateLimitExceeded { retry_after_secs: Option<u64> },

    #[error("Spotify API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Source of fresh artist metrics
///
/// Implemented by [`SpotifyClient`]; tests substitute a fixed provider.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Fetch current metrics for `ids`
    ///
    /// Ids the provider does not know are omitted from the result.
    async fn fetch_artists(&self, ids: &[String]) -> Result<Vec<ArtistMetrics>, SpotifyError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct ArtistsResponse {
    // Unknown ids come back as null entries
    artists: Vec<Option<SpotifyArtist>>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    id: String,
    name: String,
    popularity: i64,
    followers: SpotifyFollowers,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Debug, Deserialize)]
struct SpotifyFollowers {
    total: i64,
}

#[derive(Debug, Deserialize)]
struct SpotifyImage {
    url: String,
}

impl From<SpotifyArtist> for ArtistMetrics {
    fn from(artist: SpotifyArtist) -> Self {
        Self {
            spotify_id: artist.id,
            name: artist.name,
            // Spotify orders images widest first
            image_url: artist.images.into_iter().next().map(|image| image.url),
            genres: artist.genres,
            popularity: artist.popularity,
            followers: artist.followers.total,
        }
    }
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Rate limiter enforcing a minimum spacing between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Spotify rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    credentials: SpotifyCredentials,
    accounts_base_url: String,
    api_base_url: String,
    token: Mutex<Option<CachedToken>>,
    rate_limiter: RateLimiter,
}

impl SpotifyClient {
    /// Create a client against the public Spotify endpoints
    ///
    /// Fails if either credential is blank.
    pub fn new(credentials: SpotifyCredentials) -> Result<Self, SpotifyError> {
        Self::with_base_urls(credentials, ACCOUNTS_BASE_URL, API_BASE_URL)
    }

    /// Create a client against alternate endpoints (local fakes, proxies)
    pub fn with_base_urls(
        credentials: SpotifyCredentials,
        accounts_base_url: &str,
        api_base_url: &str,
    ) -> Result<Self, SpotifyError> {
        if !is_valid_key(&credentials.client_id) || !is_valid_key(&credentials.client_secret) {
            return Err(SpotifyError::Config(
                "client id and client secret must both be set".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SpotifyError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            credentials,
            accounts_base_url: accounts_base_url.trim_end_matches('/').to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
            rate_limiter: RateLimiter::new(RATE_LIMIT_MS),
        })
    }

    /// Current access token, requesting a new one when missing or near expiry
    async fn access_token(&self) -> Result<String, SpotifyError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.request_token().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// Client-credentials grant
    async fn request_token(&self) -> Result<CachedToken, SpotifyError> {
        let url = format!("{}/api/token", self.accounts_base_url);
        tracing::debug!(url = %url, "Requesting Spotify access token");

        let response = self
            .http_client
            .post(&url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| SpotifyError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpotifyError::AuthError(format!(
                "token request rejected ({}): {}",
                status.as_u16(),
                error_text
            )));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpotifyError::ApiError(status.as_u16(), error_text));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SpotifyError::ParseError(e.to_string()))?;

        if !token.token_type.is_empty() && !token.token_type.eq_ignore_ascii_case("bearer") {
            return Err(SpotifyError::AuthError(format!(
                "unexpected token type: {}",
                token.token_type
            )));
        }

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        tracing::info!(expires_in = token.expires_in, "Obtained Spotify access token");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }

    /// Fetch one batch of at most [`MAX_IDS_PER_REQUEST`] ids
    ///
    /// A 401 drops the cached token and retries once with a fresh one.
    async fn fetch_batch(&self, ids: &[String]) -> Result<Vec<ArtistMetrics>, SpotifyError> {
        let url = format!("{}/artists", self.api_base_url);
        let joined = ids.join(",");

        for attempt in 1..=2 {
            let token = self.access_token().await?;
            self.rate_limiter.wait().await;

            tracing::debug!(count = ids.len(), attempt, "Querying Spotify artists");

            let response = self
                .http_client
                .get(&url)
                .query(&[("ids", joined.as_str())])
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| SpotifyError::NetworkError(e.to_string()))?;

            let status = response.status();

            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.invalidate_token().await;
                tracing::warn!(attempt, "Spotify rejected access token");
                continue;
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok());
                return Err(SpotifyError::RateLimitExceeded { retry_after_secs });
            }

            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(SpotifyError::ApiError(status.as_u16(), error_text));
            }

            let body: ArtistsResponse = response
                .json()
                .await
                .map_err(|e| SpotifyError::ParseError(e.to_string()))?;

            return Ok(body.artists.into_iter().flatten().map(ArtistMetrics::from).collect());
        }

        Err(SpotifyError::AuthError(
            "access token rejected after refresh".to_string(),
        ))
    }
}

#[async_trait]
impl MetricsProvider for SpotifyClient {
    async fn fetch_artists(&self, ids: &[String]) -> Result<Vec<ArtistMetrics>, SpotifyError> {
        let mut metrics = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            metrics.extend(self.fetch_batch(chunk).await?);
        }
        Ok(metrics)
    }
}
