use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ShortenerConfig;

/// Why a link could not be shortened. Every kind is handled the same way by
/// callers (fall back to the long link); the distinction is only for logs.
#[derive(Debug, Error)]
pub enum ShortenError {
    #[error("shortening service timed out")]
    Timeout,
    #[error("shortening service unreachable: {0}")]
    Network(String),
    #[error("shortening service returned HTTP {0} with an unreadable body")]
    Status(u16),
    #[error("unexpected response from shortening service: {0}")]
    Malformed(String),
    #[error("shortening service rejected the request (status {status:?}): {message}")]
    Rejected { status: String, message: String },
}

impl From<reqwest::Error> for ShortenError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ShortenError::Timeout
        } else {
            ShortenError::Network(e.to_string())
        }
    }
}

#[async_trait]
pub trait UrlShortener: Send + Sync {
    async fn shorten(&self, long_url: &str) -> Result<String, ShortenError>;
}

/// Shorten `long_url`, or `None` if the service cannot. Never fails.
pub async fn shorten_or_none(shortener: &dyn UrlShortener, long_url: &str) -> Option<String> {
    match shortener.shorten(long_url).await {
        Ok(short) => {
            debug!("Shortened {} -> {}", long_url, short);
            Some(short)
        }
        Err(e) => {
            warn!("Falling back to unshortened link: {}", e);
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct ShortenResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "shortenedUrl")]
    shortened_url: Option<String>,
    #[serde(default)]
    message: Option<serde_json::Value>,
}

/// Interpret a shortening-service response body.
///
/// Success means `"status": "success"` together with a non-empty
/// `shortenedUrl`. Anything else is an error.
fn parse_response(body: &str) -> Result<String, ShortenError> {
    let resp: ShortenResponse =
        serde_json::from_str(body).map_err(|e| ShortenError::Malformed(e.to_string()))?;

    match resp.status.as_deref() {
        Some("success") => resp
            .shortened_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ShortenError::Malformed("success without shortenedUrl".to_string())),
        other => Err(ShortenError::Rejected {
            status: other.unwrap_or("<missing>").to_string(),
            message: resp
                .message
                .map(|m| match m {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .unwrap_or_default(),
        }),
    }
}

/// Client for ViralBox-style shorteners: `GET <api_url>?api=<key>&url=<long>`.
pub struct ViralboxClient {
    client: reqwest::Client,
    config: ShortenerConfig,
}

impl ViralboxClient {
    pub fn new(config: ShortenerConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        info!(
            "Shortener configured: url={}, timeout={:?}",
            config.api_url, config.timeout
        );
        Ok(Self { client, config })
    }
}

#[async_trait]
impl UrlShortener for ViralboxClient {
    async fn shorten(&self, long_url: &str) -> Result<String, ShortenError> {
        debug!("Requesting short link from {}", self.config.api_url);

        let response = self
            .client
            .get(&self.config.api_url)
            .query(&[("api", self.config.api_key.as_str()), ("url", long_url)])
            .send()
            .await?;

        // The body decides success; the HTTP status only matters when the
        // body is not something we understand.
        let status = response.status();
        let body = response.text().await?;
        match parse_response(&body) {
            Err(ShortenError::Malformed(_)) if !status.is_success() => {
                Err(ShortenError::Status(status.as_u16()))
            }
            result => result,
        }
    }
}
