//! Batch drivers: generate-and-publish over matched tasks, publish-only over
//! the unposted records of the store.

use tracing::{info, instrument, warn};

use articlesmith_publisher::Publisher;
use articlesmith_shared::{ArticleRecord, ArticleUpdate, BatchConfig, MatchedTask, Result};
use articlesmith_storage::ArticleStore;

use crate::category::CategoryResolver;
use crate::pipeline::{Pipeline, pause};

/// Progress callback for batch runs.
pub trait BatchProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before an item is processed. `current` is 1-based.
    fn item_started(&self, label: &str, current: usize, total: usize);
    /// Called after an item is processed.
    fn item_finished(&self, ok: bool);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentBatchProgress;

impl BatchProgress for SilentBatchProgress {
    fn phase(&self, _name: &str) {}
    fn item_started(&self, _label: &str, _current: usize, _total: usize) {}
    fn item_finished(&self, _ok: bool) {}
}

/// Counters from a generate batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub total: usize,
    pub generated: usize,
    pub failed: usize,
    pub published: usize,
    pub publish_failed: usize,
}

/// Counters from a publish-only batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishStats {
    pub total: usize,
    pub published: usize,
    pub failed: usize,
}

/// Generate, store and optionally publish one article per task.
///
/// Pass `publisher` only when its health check passed. Generation and storage
/// failures are counted and skipped; a publisher configuration error aborts.
#[instrument(skip_all, fields(tasks = tasks.len(), publish = publisher.is_some()))]
pub async fn run_generate_batch(
    pipeline: &Pipeline,
    store: &ArticleStore,
    publisher: Option<&Publisher>,
    tasks: &[MatchedTask],
    config: &BatchConfig,
    progress: &dyn BatchProgress,
) -> Result<GenerateStats> {
    let mut stats = GenerateStats {
        total: tasks.len(),
        ..Default::default()
    };
    progress.phase("Generating articles");

    for (i, task) in tasks.iter().enumerate() {
        if i > 0 {
            pause(config.generate_delay).await;
        }
        let label = if task.keyword.title_idea.is_empty() {
            &task.keyword.main_keyword
        } else {
            &task.keyword.title_idea
        };
        progress.item_started(label, i + 1, tasks.len());

        let article = match pipeline.generate_one(task).await {
            Ok(article) => article,
            Err(e) => {
                warn!(keyword = %task.keyword.id, error = %e, "article generation failed");
                stats.failed += 1;
                progress.item_finished(false);
                continue;
            }
        };

        let stored = match store.append(article) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(keyword = %task.keyword.id, error = %e, "failed to store generated article");
                stats.failed += 1;
                progress.item_finished(false);
                continue;
            }
        };
        stats.generated += 1;

        let mut ok = true;
        if let Some(publisher) = publisher {
            if publish_and_mark(publisher, store, &stored).await? {
                stats.published += 1;
            } else {
                stats.publish_failed += 1;
                ok = false;
            }
        }
        progress.item_finished(ok);
    }

    info!(
        total = stats.total,
        generated = stats.generated,
        failed = stats.failed,
        published = stats.published,
        publish_failed = stats.publish_failed,
        "generate batch complete"
    );
    Ok(stats)
}

/// Publish every unposted record in store order.
///
/// Label categories are resolved first; an unknown label counts as a failure,
/// while a catalog or publisher configuration error aborts the batch.
#[instrument(skip_all)]
pub async fn run_publish_batch(
    store: &ArticleStore,
    publisher: &Publisher,
    resolver: &CategoryResolver,
    config: &BatchConfig,
    progress: &dyn BatchProgress,
) -> Result<PublishStats> {
    let records = store.unposted()?;
    let mut stats = PublishStats {
        total: records.len(),
        ..Default::default()
    };
    progress.phase("Publishing articles");

    for (i, mut record) in records.into_iter().enumerate() {
        if i > 0 {
            pause(config.publish_delay).await;
        }
        progress.item_started(&record.title, i + 1, stats.total);

        match resolver.resolve_category(&record.category_id) {
            Ok(category_id) => record.category_id = category_id,
            Err(e) if e.is_config() => return Err(e),
            Err(e) => {
                warn!(id = ?record.id, title = %record.title, error = %e, "cannot resolve category");
                stats.failed += 1;
                progress.item_finished(false);
                continue;
            }
        }

        let ok = publish_and_mark(publisher, store, &record).await?;
        if ok {
            stats.published += 1;
        } else {
            stats.failed += 1;
        }
        progress.item_finished(ok);
    }

    info!(
        total = stats.total,
        published = stats.published,
        failed = stats.failed,
        "publish batch complete"
    );
    Ok(stats)
}

/// Publish `record` and flag it as posted on success.
///
/// `Ok(false)` covers every per-item failure; only configuration errors
/// surface as `Err`.
async fn publish_and_mark(
    publisher: &Publisher,
    store: &ArticleStore,
    record: &ArticleRecord,
) -> Result<bool> {
    let Some(id) = record.id else {
        warn!(title = %record.title, "article has no id, skipping publish");
        return Ok(false);
    };

    let outcome = publisher.publish(record).await?;
    if !outcome.success {
        warn!(id, title = %record.title, message = outcome.message.as_deref().unwrap_or(""), "publish failed");
        return Ok(false);
    }

    if let Err(e) = store.update(id, ArticleUpdate::posted()) {
        warn!(id, error = %e, "published but failed to mark article as posted");
        return Ok(false);
    }
    info!(id, remote_id = ?outcome.remote_id, "article marked as posted");
    Ok(true)
}
