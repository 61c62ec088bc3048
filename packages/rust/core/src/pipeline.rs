//! Two-pass article pipeline: draft → SEO optimization → category → record.

use std::time::Duration;

use tracing::{info, instrument, warn};

use articlesmith_generation::{GenerationClient, ModelClient, OptimizationClient};
use articlesmith_shared::{ArticleRecord, ArticleStatus, CategoryId, MatchedTask, ModelConfig, Result};

use crate::category::CategoryResolver;

/// Composes the generation and optimization clients with category resolution.
#[derive(Debug, Clone)]
pub struct Pipeline {
    generator: GenerationClient,
    optimizer: OptimizationClient,
    resolver: CategoryResolver,
}

impl Pipeline {
    pub fn new(
        generator: GenerationClient,
        optimizer: OptimizationClient,
        resolver: CategoryResolver,
    ) -> Self {
        Self {
            generator,
            optimizer,
            resolver,
        }
    }

    /// Build both model clients from the runtime model config.
    pub fn from_config(config: &ModelConfig, resolver: CategoryResolver) -> Result<Self> {
        let client = ModelClient::new(config)?;
        Ok(Self::new(
            GenerationClient::new(client.clone(), &config.generation_model),
            OptimizationClient::new(client, &config.optimization_model),
            resolver,
        ))
    }

    pub fn resolver(&self) -> &CategoryResolver {
        &self.resolver
    }

    /// Generate one finished article for `task`.
    ///
    /// Any failure aborts the task; no partial article is returned. The record
    /// has no id yet, `status = draft` and `api_posted = false`.
    #[instrument(skip_all, fields(keyword = %task.keyword.id, category = %task.persona.category))]
    pub async fn generate_one(&self, task: &MatchedTask) -> Result<ArticleRecord> {
        let draft = self.generator.generate(task).await?;
        let article = self.optimizer.optimize(&draft, task).await?;
        let category_id = self.resolver.resolve(&task.persona.category)?;

        info!(title = %article.title, category_id, "article generated");

        Ok(ArticleRecord {
            id: None,
            category_id: CategoryId::Id(category_id),
            title: article.title,
            body: article.body,
            slug: article.slug,
            status: ArticleStatus::Draft,
            meta_title: article.meta_title,
            meta_description: article.meta_description,
            api_posted: false,
        })
    }

    /// Generate articles for every task in order, skipping failures.
    ///
    /// `delay` separates successive calls (none after the last). Only the
    /// successful records are returned; failures are logged.
    #[instrument(skip_all, fields(tasks = tasks.len()))]
    pub async fn generate_many(&self, tasks: &[MatchedTask], delay: Duration) -> Vec<ArticleRecord> {
        let mut articles = Vec::with_capacity(tasks.len());
        let mut failed = 0usize;

        for (i, task) in tasks.iter().enumerate() {
            if i > 0 {
                pause(delay).await;
            }

            match self.generate_one(task).await {
                Ok(article) => articles.push(article),
                Err(e) => {
                    failed += 1;
                    warn!(
                        keyword = %task.keyword.id,
                        title_idea = %task.keyword.title_idea,
                        error = %e,
                        "article generation failed"
                    );
                }
            }
        }

        info!(generated = articles.len(), failed, "generation batch complete");
        articles
    }
}

/// Sleep for `delay`, skipping the timer entirely for zero.
pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
