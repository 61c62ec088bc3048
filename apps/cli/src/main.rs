//! ArticleSmith CLI: persona-driven article generation.
//!
//! Matches personas to keywords, drafts and optimizes articles with local
//! models, stores them in a CSV file and publishes them to the article API.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
