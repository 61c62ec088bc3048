//! Language-model clients for the two generation passes.
//!
//! Both passes talk to an Ollama-compatible `POST {base_url}/api/generate`
//! endpoint, asking for a single non-streaming JSON reply:
//! - [`GenerationClient`] writes a draft `{title, body, slug}` for a task
//! - [`OptimizationClient`] rewrites a draft for SEO and adds meta fields
//!
//! Neither client retries. Transport failures are returned unchanged.

mod extract;
pub mod prompts;

use articlesmith_shared::{ArticleSmithError, MatchedTask, ModelConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub use extract::{NO_JSON_MESSAGE, extract_json_object, parse_object, slugify};

/// User-Agent string for model requests.
const USER_AGENT: &str = concat!("ArticleSmith/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// First-pass article produced by the draft model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub body: String,
    pub slug: String,
}

/// SEO-optimized article produced by the second pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedArticle {
    pub title: String,
    pub body: String,
    pub slug: String,
    pub meta_title: String,
    pub meta_description: String,
}

/// Parse a draft reply. A missing slug is derived from the title.
pub fn parse_draft(raw: &str) -> Result<Draft> {
    let object = extract::parse_object(raw)?;
    let title = extract::required_str(&object, "title")?;
    let body = extract::required_str(&object, "body")?;
    let slug = extract::optional_str(&object, "slug").unwrap_or_else(|| slugify(&title));

    Ok(Draft { title, body, slug })
}

/// Parse an optimization reply. A missing slug keeps the draft's slug.
pub fn parse_optimized(raw: &str, draft_slug: &str) -> Result<OptimizedArticle> {
    let object = extract::parse_object(raw)?;

    Ok(OptimizedArticle {
        title: extract::required_str(&object, "title")?,
        body: extract::required_str(&object, "body")?,
        slug: extract::optional_str(&object, "slug").unwrap_or_else(|| draft_slug.to_string()),
        meta_title: extract::required_str(&object, "meta_title")?,
        meta_description: extract::required_str(&object, "meta_description")?,
    })
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

// ---------------------------------------------------------------------------
// ModelClient
// ---------------------------------------------------------------------------

/// Thin HTTP client for the model service. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ModelClient {
    client: Client,
    endpoint: String,
    temperature: f32,
    top_p: f32,
}

impl ModelClient {
    /// Build a client with the configured per-request timeout.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ArticleSmithError::Transport(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", config.base_url.trim_end_matches('/')),
            temperature: config.temperature,
            top_p: config.top_p,
        })
    }

    /// Submit one prompt and return the raw reply text.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            format: "json",
            options: GenerateOptions {
                temperature: self.temperature,
                top_p: self.top_p,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ArticleSmithError::Transport(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArticleSmithError::Transport(format!(
                "{}: HTTP {status}: {}",
                self.endpoint,
                extract::excerpt(&body)
            )));
        }

        let reply: GenerateResponse = response.json().await.map_err(|e| {
            ArticleSmithError::Transport(format!("{}: unreadable reply: {e}", self.endpoint))
        })?;

        debug!(model, chars = reply.response.chars().count(), "model replied");
        Ok(reply.response)
    }
}

// ---------------------------------------------------------------------------
// Pass clients
// ---------------------------------------------------------------------------

/// Draft writer: persona + keyword in, `{title, body, slug}` out.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    client: ModelClient,
    model: String,
}

impl GenerationClient {
    pub fn new(client: ModelClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    #[instrument(skip_all, fields(keyword = %task.keyword.id, model = %self.model))]
    pub async fn generate(&self, task: &MatchedTask) -> Result<Draft> {
        let prompt = prompts::draft_prompt(task);
        let raw = self.client.generate(&self.model, &prompt).await?;
        let draft = parse_draft(&raw)?;
        debug!(title = %draft.title, body_chars = draft.body.chars().count(), "draft generated");
        Ok(draft)
    }
}

/// SEO optimizer: draft + keyword context in, optimized article out.
#[derive(Debug, Clone)]
pub struct OptimizationClient {
    client: ModelClient,
    model: String,
}

impl OptimizationClient {
    pub fn new(client: ModelClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    #[instrument(skip_all, fields(keyword = %task.keyword.id, model = %self.model))]
    pub async fn optimize(&self, draft: &Draft, task: &MatchedTask) -> Result<OptimizedArticle> {
        let prompt = prompts::optimization_prompt(draft, task);
        let raw = self.client.generate(&self.model, &prompt).await?;
        let article = parse_optimized(&raw, &draft.slug)?;
        debug!(title = %article.title, body_chars = article.body.chars().count(), "draft optimized");
        Ok(article)
    }
}
