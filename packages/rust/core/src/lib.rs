//! Domain logic for ArticleSmith.
//!
//! This crate ties together persona/keyword matching, the two-pass model
//! pipeline, category resolution and publishing into the batch workflows the
//! CLI drives.

pub mod batch;
pub mod category;
pub mod matcher;
pub mod pipeline;

#[cfg(test)]
mod test_support;

pub use batch::{
    BatchProgress, GenerateStats, PublishStats, SilentBatchProgress, run_generate_batch,
    run_publish_batch,
};
pub use category::{CATEGORY_TABLE, CategoryResolver};
pub use matcher::match_tasks;
pub use pipeline::Pipeline;
