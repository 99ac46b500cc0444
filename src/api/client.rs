use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

use super::types::{RawAlbum, RawComment, RawPhoto};
use super::{AlbumsRequest, CommentsRequest, LikesRequest, PhotoSource, PhotosRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.vk.com/";
pub const DEFAULT_API_VERSION: &str = "5.27";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api returned {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("api error {code}: {message}")]
    Vk { code: i64, message: String },
    #[error("unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("api response has neither `response` nor `error`")]
    MissingResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorClass {
    Auth,
    RateLimit,
    Transient,
    Permanent,
}

impl ApiError {
    pub fn classification(&self) -> ApiErrorClass {
        match self {
            ApiError::Request(e) if e.is_builder() => ApiErrorClass::Permanent,
            ApiError::Request(_) => ApiErrorClass::Transient,
            ApiError::Http { status, .. } => classify_http_status(*status),
            ApiError::Vk { code, .. } => classify_vk_code(*code),
            ApiError::Url(_) | ApiError::Decode(_) | ApiError::MissingResponse => {
                ApiErrorClass::Permanent
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.classification(),
            ApiErrorClass::RateLimit | ApiErrorClass::Transient
        )
    }
}

fn classify_http_status(status: StatusCode) -> ApiErrorClass {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        ApiErrorClass::Auth
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        ApiErrorClass::RateLimit
    } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        ApiErrorClass::Transient
    } else {
        ApiErrorClass::Permanent
    }
}

fn classify_vk_code(code: i64) -> ApiErrorClass {
    match code {
        // too many requests per second, flood control
        6 | 9 => ApiErrorClass::RateLimit,
        // unknown error, internal server error
        1 | 10 => ApiErrorClass::Transient,
        5 => ApiErrorClass::Auth,
        _ => ApiErrorClass::Permanent,
    }
}

/// Connection settings for [`VkClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub access_token: String,
    pub version: String,
    pub timeout: Duration,
    /// Minimum spacing between two requests.
    pub min_interval: Duration,
}

impl ClientConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: access_token.into(),
            version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(30),
            min_interval: Duration::from_millis(350),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    response: Option<Value>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error_code: i64,
    #[serde(default, alias = "error_description")]
    error_msg: String,
}

/// HTTP client for the `photos.*` and `likes.*` API methods.
pub struct VkClient {
    http: Client,
    base_url: Url,
    token: String,
    version: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl VkClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            token: config.access_token,
            version: config.version,
            min_interval: config.min_interval,
            last_request: Mutex::new(None),
        })
    }

    /// Invoke an API method and return the `response` payload.
    pub async fn call(&self, method: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
        self.throttle().await;

        let mut url = self.base_url.join(&format!("method/{method}"))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("access_token", &self.token);
            query.append_pair("v", &self.version);
        }

        log::debug!("GET {method} {params:?}");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http { status, body });
        }
        let body = response.text().await?;
        let envelope: Envelope = serde_json::from_str(&body)?;
        if let Some(err) = envelope.error {
            return Err(ApiError::Vk {
                code: err.error_code,
                message: err.error_msg,
            });
        }
        envelope.response.ok_or(ApiError::MissingResponse)
    }

    /// Invoke a listing method and decode its items.
    pub async fn list<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let payload = self.call(method, params).await?;
        items(payload)
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(ApiError::from))
            .collect()
    }

    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(at) = *last {
            let elapsed = at.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Listing payloads come either as `{"count": N, "items": [...]}` or as a
/// bare array.
fn items(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[async_trait]
impl PhotoSource for VkClient {
    async fn get_albums(&self, req: AlbumsRequest) -> Result<Vec<RawAlbum>, ApiError> {
        self.list("photos.getAlbums", &req.params()).await
    }

    async fn get_photos(&self, req: PhotosRequest) -> Result<Vec<RawPhoto>, ApiError> {
        self.list("photos.get", &req.params()).await
    }

    async fn get_comments(&self, req: CommentsRequest) -> Result<Vec<RawComment>, ApiError> {
        self.list("photos.getComments", &req.params()).await
    }

    async fn get_likes(&self, req: LikesRequest) -> Result<Vec<i64>, ApiError> {
        self.list("likes.getList", &req.params()).await
    }

    async fn delete_comment(&self, owner_id: i64, comment_id: u64) -> Result<(), ApiError> {
        let params = [
            ("owner_id", owner_id.to_string()),
            ("comment_id", comment_id.to_string()),
        ];
        self.call("photos.deleteComment", &params).await?;
        Ok(())
    }

    async fn restore_comment(&self, owner_id: i64, comment_id: u64) -> Result<(), ApiError> {
        let params = [
            ("owner_id", owner_id.to_string()),
            ("comment_id", comment_id.to_string()),
        ];
        self.call("photos.restoreComment", &params).await?;
        Ok(())
    }
}
