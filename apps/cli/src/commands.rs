//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use articlesmith_core::{
    BatchProgress, CategoryResolver, Pipeline, match_tasks, run_generate_batch, run_publish_batch,
};
use articlesmith_publisher::Publisher;
use articlesmith_shared::{
    AppConfig, BatchConfig, KeywordRecord, MatchedTask, ModelConfig, PersonaRecord,
    PublisherConfig, init_config, load_config,
};
use articlesmith_storage::{ArticleStore, load_catalog, read_all};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ArticleSmith: persona-driven article generation and publishing.
#[derive(Parser)]
#[command(
    name = "articlesmith",
    version,
    about = "Generate persona-targeted articles with local models and publish them.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./articlesmith.toml, then ~/.articlesmith/articlesmith.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Force publisher mock mode: nothing is sent to the publishing API.
    #[arg(long, global = true)]
    pub mock: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate articles for every matched persona/keyword pair.
    Generate {
        /// Publish each article right after it is stored.
        #[arg(long)]
        publish: bool,

        /// Process at most this many tasks.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Publish every stored article not yet accepted by the API.
    Publish,

    /// Probe the publishing API health endpoint.
    Health,

    /// Print matched tasks without calling any model.
    Match,

    /// List stored articles.
    List {
        /// Only articles not yet posted.
        #[arg(long)]
        unposted: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "articlesmith=info",
        1 => "articlesmith=debug",
        _ => "articlesmith=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    let explicit = cli.config.as_deref();

    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init(explicit),
            ConfigAction::Show => cmd_config_show(explicit, cli.mock),
        };
    }

    let config = resolve_config(explicit, cli.mock)?;
    match cli.command {
        Command::Generate { publish, limit } => cmd_generate(&config, publish, limit).await,
        Command::Publish => cmd_publish(&config).await,
        Command::Health => cmd_health(&config).await,
        Command::Match => cmd_match(&config),
        Command::List { unposted } => cmd_list(&config, unposted),
        Command::Config { .. } => Ok(ExitCode::SUCCESS),
    }
}

/// Load config and apply the `--mock` override.
fn resolve_config(explicit: Option<&Path>, mock: bool) -> Result<AppConfig> {
    let mut config = load_config(explicit)?;
    if mock {
        config.publisher.mock = true;
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn load_tasks(config: &AppConfig) -> Result<Vec<MatchedTask>> {
    let personas: Vec<PersonaRecord> = read_all(&config.paths.persona_csv)
        .wrap_err("failed to load personas")?;
    let keywords: Vec<KeywordRecord> = read_all(&config.paths.keyword_csv)
        .wrap_err("failed to load keywords")?;
    info!(personas = personas.len(), keywords = keywords.len(), "loaded inputs");
    Ok(match_tasks(&personas, &keywords))
}

/// Load the catalog and check the category mapping before any model call.
fn load_resolver(config: &AppConfig) -> Result<CategoryResolver> {
    let catalog = load_catalog(&config.paths.catalog)?;
    let resolver = CategoryResolver::new(&catalog);
    resolver.validate().wrap_err("category mapping does not match the catalog")?;
    Ok(resolver)
}

async fn cmd_generate(config: &AppConfig, publish: bool, limit: Option<usize>) -> Result<ExitCode> {
    let mut tasks = load_tasks(config)?;
    if let Some(limit) = limit {
        tasks.truncate(limit);
    }
    if tasks.is_empty() {
        println!("No matched tasks: nothing to generate.");
        return Ok(ExitCode::SUCCESS);
    }

    let resolver = load_resolver(config)?;
    let pipeline = Pipeline::from_config(&ModelConfig::from(config), resolver)?;
    let store = ArticleStore::new(&config.paths.article_csv);

    let publisher = if publish {
        let publisher = Publisher::new(PublisherConfig::from(config))?;
        if publisher.health_check().await {
            Some(publisher)
        } else {
            warn!("publishing API is unhealthy, articles will only be stored");
            println!("Publishing API is unhealthy: articles will be stored but not published.");
            None
        }
    } else {
        None
    };

    info!(tasks = tasks.len(), publish = publisher.is_some(), "starting generation");

    let progress = CliProgress::new();
    let stats = run_generate_batch(
        &pipeline,
        &store,
        publisher.as_ref(),
        &tasks,
        &BatchConfig::from(config),
        &progress,
    )
    .await;
    progress.finish();
    let stats = stats?;

    println!();
    println!("  Generation finished");
    println!("  Tasks:          {}", stats.total);
    println!("  Generated:      {}", stats.generated);
    println!("  Failed:         {}", stats.failed);
    if publisher.is_some() {
        println!("  Published:      {}", stats.published);
        println!("  Publish failed: {}", stats.publish_failed);
    }
    println!("  Articles:       {}", store.path().display());
    println!();

    Ok(ExitCode::SUCCESS)
}

async fn cmd_publish(config: &AppConfig) -> Result<ExitCode> {
    let resolver = load_resolver(config)?;
    let publisher = Publisher::new(PublisherConfig::from(config))?;
    let store = ArticleStore::new(&config.paths.article_csv);

    if publisher.is_mock() {
        println!("Mock mode: nothing will be sent to the publishing API.");
    }

    let progress = CliProgress::new();
    let stats = run_publish_batch(
        &store,
        &publisher,
        &resolver,
        &BatchConfig::from(config),
        &progress,
    )
    .await;
    progress.finish();
    let stats = stats?;

    println!();
    println!("  Publishing finished");
    println!("  Unposted:  {}", stats.total);
    println!("  Published: {}", stats.published);
    println!("  Failed:    {}", stats.failed);
    println!();

    Ok(ExitCode::SUCCESS)
}

async fn cmd_health(config: &AppConfig) -> Result<ExitCode> {
    let publisher = Publisher::new(PublisherConfig::from(config))?;
    if publisher.health_check().await {
        println!("Publishing API is healthy.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Publishing API is unhealthy.");
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_match(config: &AppConfig) -> Result<ExitCode> {
    let tasks = load_tasks(config)?;
    for task in &tasks {
        println!(
            "{}\t{}\t{}",
            task.keyword.id, task.keyword.category, task.keyword.main_keyword
        );
    }
    println!("{} matched task(s)", tasks.len());
    Ok(ExitCode::SUCCESS)
}

fn cmd_list(config: &AppConfig, unposted: bool) -> Result<ExitCode> {
    let store = ArticleStore::new(&config.paths.article_csv);
    let articles = if unposted {
        store.unposted()?
    } else {
        store.read_all()?
    };

    for article in &articles {
        let id = article
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".into());
        let posted = if article.api_posted { "posted" } else { "unposted" };
        println!("{id}\t{}\t{posted}\t{}", article.status, article.title);
    }
    println!("{} article(s)", articles.len());
    Ok(ExitCode::SUCCESS)
}

fn cmd_config_init(explicit: Option<&Path>) -> Result<ExitCode> {
    let path = init_config(explicit)?;
    println!("Config initialized at: {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_config_show(explicit: Option<&Path>, mock: bool) -> Result<ExitCode> {
    let config = resolve_config(explicit, mock)?;
    let toml_str = toml::to_string_pretty(&config).map_err(|e| eyre!("cannot render config: {e}"))?;
    println!("{toml_str}");
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl BatchProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn item_started(&self, label: &str, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current.saturating_sub(1) as u64);
        self.bar.set_message(label.to_string());
    }

    fn item_finished(&self, ok: bool) {
        if !ok {
            self.bar.println(format!("  failed: {}", self.bar.message()));
        }
        self.bar.inc(1);
    }
}
