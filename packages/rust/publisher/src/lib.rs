//! Remote publishing API client.
//!
//! [`Publisher::publish`] posts an article with bearer-token auth and reports
//! the outcome as a [`PublishOutcome`]. Remote failures (timeouts, refused
//! connections, unexpected statuses) become `success: false`; only local
//! configuration errors are returned as `Err`. In mock mode nothing is sent.

use articlesmith_shared::{
    ArticleRecord, ArticleSmithError, ArticleStatus, PublisherConfig, Result,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// User-Agent string for publishing requests.
const USER_AGENT: &str = concat!("ArticleSmith/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of one publish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub success: bool,
    /// Id assigned by the publishing API.
    pub remote_id: Option<u64>,
    pub message: Option<String>,
}

impl PublishOutcome {
    fn accepted(remote_id: Option<u64>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            remote_id,
            message: Some(message.into()),
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            remote_id: None,
            message: Some(message.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Public fields of an article, as sent to the API.
#[derive(Debug, Serialize)]
struct PublishPayload<'a> {
    category_id: u32,
    title: &'a str,
    body: &'a str,
    slug: &'a str,
    status: ArticleStatus,
    meta_title: &'a str,
    meta_description: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    article: Option<CreatedArticle>,
}

#[derive(Debug, Deserialize)]
struct CreatedArticle {
    id: Option<u64>,
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Client for the publishing API.
#[derive(Debug, Clone)]
pub struct Publisher {
    client: Client,
    config: PublisherConfig,
}

impl Publisher {
    pub fn new(config: PublisherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                ArticleSmithError::Transport(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client, config })
    }

    pub fn is_mock(&self) -> bool {
        self.config.mock
    }

    /// Publish one article.
    ///
    /// Returns `Err` only for missing endpoint or token configuration.
    #[instrument(skip_all, fields(id = ?article.id, title = %article.title))]
    pub async fn publish(&self, article: &ArticleRecord) -> Result<PublishOutcome> {
        if self.config.mock {
            let remote_id = chrono::Utc::now().timestamp_millis().unsigned_abs();
            info!(remote_id, "mock publish");
            return Ok(PublishOutcome::accepted(
                Some(remote_id),
                "Mock mode: article was not sent",
            ));
        }

        let endpoint = self.config.endpoint.as_deref().ok_or_else(|| {
            ArticleSmithError::config("publisher endpoint is not configured (publisher.endpoint)")
        })?;
        let token = self.config.token.as_deref().ok_or_else(|| {
            ArticleSmithError::config(
                "publisher token is not set (environment variable named by publisher.token_env)",
            )
        })?;

        let Some(category_id) = article.category_id.as_id() else {
            return Ok(PublishOutcome::rejected(format!(
                "category '{}' has not been resolved to a catalog id",
                article.category_id
            )));
        };

        let payload = PublishPayload {
            category_id,
            title: &article.title,
            body: &article.body,
            slug: &article.slug,
            status: article.status,
            meta_title: &article.meta_title,
            meta_description: &article.meta_description,
        };

        let response = match self
            .client
            .post(endpoint)
            .bearer_auth(token)
            .timeout(self.config.timeout)
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "publish request failed");
                return Ok(PublishOutcome::rejected(format!("request failed: {e}")));
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status != StatusCode::CREATED {
            warn!(%status, "publish rejected");
            return Ok(PublishOutcome::rejected(format!(
                "unexpected status {status}: {}",
                excerpt(&body)
            )));
        }

        match serde_json::from_str::<CreatedResponse>(&body) {
            Ok(CreatedResponse {
                article: Some(created),
            }) => {
                info!(remote_id = ?created.id, "article published");
                Ok(PublishOutcome::accepted(created.id, "article created"))
            }
            _ => {
                warn!("publish response has no article object");
                Ok(PublishOutcome::rejected(format!(
                    "status 201 but response has no article object: {}",
                    excerpt(&body)
                )))
            }
        }
    }

    /// Probe the health endpoint. Never fails: problems are logged and yield `false`.
    pub async fn health_check(&self) -> bool {
        if self.config.mock {
            debug!("mock mode, skipping health check");
            return true;
        }

        let Some(endpoint) = self.config.health_endpoint.as_deref() else {
            warn!("health endpoint is not configured (publisher.health_endpoint)");
            return false;
        };

        let mut request = self
            .client
            .get(endpoint)
            .timeout(self.config.health_timeout);
        if let Some(token) = self.config.token.as_deref() {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                info!(endpoint, "publishing API is healthy");
                true
            }
            Ok(response) => {
                warn!(endpoint, status = %response.status(), "publishing API health check failed");
                false
            }
            Err(e) => {
                warn!(endpoint, error = %e, "publishing API unreachable");
                false
            }
        }
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(200).collect()
}
