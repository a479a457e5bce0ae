// Transport resolver: direct fetch with ordered proxy fallback
// Author: kelexine (https://github.com/kelexine)

use super::PageSource;
use crate::config::TransportConfig;
use crate::error::{CiteError, Result};
use crate::utils::logging::preview;
use futures::future::{BoxFuture, FutureExt};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Which hop an attempt went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Direct,
    Proxy(&'a str),
}

impl std::fmt::Display for Route<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Direct => write!(f, "direct"),
            Route::Proxy(endpoint) => write!(f, "proxy {}", endpoint),
        }
    }
}

/// Fetches a page directly, then through each configured proxy in order.
///
/// One attempt per route, no backoff: the next scheduled tick is the retry.
pub struct TransportResolver {
    http_client: Client,
    config: TransportConfig,
}

impl TransportResolver {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .pool_idle_timeout(Duration::from_secs(90))
            .use_rustls_tls()
            .build()
            .map_err(|e| CiteError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!(
            "Created transport resolver with {} proxies, {}s timeout",
            config.proxies.len(),
            config.timeout_seconds
        );

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    pub fn proxies(&self) -> &[String] {
        &self.config.proxies
    }

    /// Build the proxied form of `target` for one endpoint.
    pub fn proxied_url(endpoint: &str, target: &str) -> String {
        format!("{}{}", endpoint, urlencoding::encode(target))
    }

    /// Resolve `target` to HTML, trying the direct route first.
    pub async fn resolve(&self, target: &str, cancel: &CancellationToken) -> Result<String> {
        let mut attempts = 0;
        let mut last_error = String::new();

        let routes = std::iter::once(Route::Direct)
            .chain(self.config.proxies.iter().map(|p| Route::Proxy(p.as_str())));

        for route in routes {
            let url = match route {
                Route::Direct => target.to_string(),
                Route::Proxy(endpoint) => Self::proxied_url(endpoint, target),
            };

            attempts += 1;
            match self.attempt(&url, cancel).await {
                Ok(body) => {
                    info!("Fetched profile page via {} ({} bytes)", route, body.len());
                    return Ok(body);
                }
                Err(CiteError::Cancelled) => return Err(CiteError::Cancelled),
                Err(e) => {
                    warn!("Fetch via {} failed: {}", route, e);
                    last_error = e.to_string();
                }
            }
        }

        Err(CiteError::TransportFailure {
            attempts,
            last_error,
        })
    }

    /// Single direct attempt, used by the connection test.
    pub async fn fetch_direct(&self, target: &str) -> Result<String> {
        self.attempt(target, &CancellationToken::new()).await
    }

    async fn attempt(&self, url: &str, cancel: &CancellationToken) -> Result<String> {
        let request = async {
            let response = self
                .http_client
                .get(url)
                .header(USER_AGENT, &self.config.user_agent)
                .header(ACCEPT, &self.config.accept)
                .header(ACCEPT_LANGUAGE, &self.config.accept_language)
                .timeout(self.config.timeout())
                .send()
                .await?;

            let status = response.status();
            let body = self.read_body(response).await;
            if !status.is_success() {
                let body = body.unwrap_or_default();
                debug!("HTTP {} from {}: {}", status, url, preview(&body, 200));
                return Err(CiteError::UpstreamStatus(status.as_u16()));
            }

            body
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(CiteError::Cancelled),
            result = request => result,
        }
    }
}

impl TransportResolver {
    /// Read the body in chunks, giving up once it passes `max_body_bytes`.
    async fn read_body(&self, mut response: reqwest::Response) -> Result<String> {
        let limit = self.config.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(CiteError::BodyTooLarge { limit });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(CiteError::BodyTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl PageSource for TransportResolver {
    fn fetch_page<'a>(
        &'a self,
        url: &'a str,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<String>> {
        self.resolve(url, cancel).boxed()
    }
}
