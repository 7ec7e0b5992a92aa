#![deny(warnings)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use moodcheck_core::catalog::MoodCatalog;
use moodcheck_core::config::{
    resolve_algolia, resolve_optional_string, AlgoliaConfig, AppConfig, Env, IndexName, StdEnv,
    TopN, DEFAULT_INDEX_NAME, DEFAULT_TOP_N, ENV_ALGOLIA_API_KEY, ENV_ALGOLIA_APP_ID, ENV_MOODS_PATH,
};
use moodcheck_core::matcher::{MatcherConfig, MoodMatcher};
use moodcheck_core::search::{
    query_from_bytes, AlgoliaSearch, FallbackChain, MoodSearch, SearchResponse,
};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "moodcheck")]
#[command(about = "Detect the mood behind a transcribed utterance")]
struct Args {
    /// Mood catalog JSON; the bundled catalog is used when omitted.
    #[arg(long, global = true)]
    moods: Option<PathBuf>,

    #[arg(long, global = true, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    #[arg(long, global = true)]
    algolia_app_id: Option<String>,

    #[arg(long, global = true)]
    algolia_api_key: Option<String>,

    #[arg(long, global = true, default_value = DEFAULT_INDEX_NAME)]
    index: String,

    /// Algolia filter expression applied to index queries, e.g. `NOT id:neutral`.
    #[arg(long, global = true)]
    filters: Option<String>,

    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect the mood of QUERY (read from stdin when omitted).
    Detect {
        query: Option<String>,

        /// Print the full index-style response as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Upload the mood catalog to the Algolia index.
    SetupIndex,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let command = args.command;
    let filters = args.filters;
    let cfg = build_config(
        args.moods,
        args.top_n,
        args.algolia_app_id,
        args.algolia_api_key,
        args.index,
        &env,
    )?;

    tracing::info!(
        top_n = cfg.top_n.get(),
        algolia = cfg.algolia.is_some(),
        "config loaded"
    );

    let catalog = Arc::new(load_catalog(&cfg)?);

    match command {
        Command::Detect { query, json } => {
            let query = match query {
                Some(q) => q,
                None => read_stdin_query()?,
            };
            run_detect(&cfg, catalog, &query, json, filters).await
        }
        Command::SetupIndex => run_setup_index(&cfg, &catalog).await,
    }
}

async fn run_detect(
    cfg: &AppConfig,
    catalog: Arc<MoodCatalog>,
    query: &str,
    json: bool,
    filters: Option<String>,
) -> anyhow::Result<()> {
    let matcher = MoodMatcher::with_config(MatcherConfig {
        top_n: cfg.top_n.get(),
    });
    let primary = cfg
        .algolia
        .as_ref()
        .map(|a| Box::new(algolia_search(a, filters)) as Box<dyn MoodSearch>);
    let chain = FallbackChain::standard(catalog, matcher, primary);

    let outcome = chain.detect(query).await.context("mood detection failed")?;

    if json {
        let response = SearchResponse::new(query, outcome.into_hits(), cfg.top_n.get());
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let top = outcome.top();
    println!("{} {} ({})", top.emoji, top.name, outcome.strategy());
    println!("{}", top.support_message_or_default());
    for suggestion in &top.suggestions {
        println!("  - {suggestion}");
    }
    Ok(())
}

fn algolia_search(config: &AlgoliaConfig, filters: Option<String>) -> AlgoliaSearch {
    let search = AlgoliaSearch::new(config);
    match filters {
        Some(filters) if !filters.trim().is_empty() => search.with_filters(filters),
        _ => search,
    }
}

async fn run_setup_index(cfg: &AppConfig, catalog: &MoodCatalog) -> anyhow::Result<()> {
    let algolia = cfg.algolia.as_ref().with_context(|| {
        format!("Algolia credentials not set: provide --algolia-app-id/--algolia-api-key or {ENV_ALGOLIA_APP_ID}/{ENV_ALGOLIA_API_KEY}")
    })?;

    let uploaded = AlgoliaSearch::new(algolia)
        .upload_catalog(catalog)
        .await
        .context("failed to upload mood catalog")?;

    tracing::info!(records = uploaded, index = %algolia.index.as_str(), "mood catalog uploaded");
    Ok(())
}

fn load_catalog(cfg: &AppConfig) -> anyhow::Result<MoodCatalog> {
    match &cfg.catalog_path {
        Some(path) => MoodCatalog::from_path(path)
            .with_context(|| format!("invalid mood catalog: {}", path.display())),
        None => MoodCatalog::builtin().context("bundled mood catalog is invalid"),
    }
}

fn read_stdin_query() -> anyhow::Result<String> {
    let mut bytes = Vec::new();
    std::io::stdin()
        .read_to_end(&mut bytes)
        .context("failed to read query from stdin")?;
    Ok(query_from_bytes(bytes)?)
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn build_config(
    moods: Option<PathBuf>,
    top_n: usize,
    algolia_app_id: Option<String>,
    algolia_api_key: Option<String>,
    index: String,
    env: &impl Env,
) -> anyhow::Result<AppConfig> {
    let catalog_path = moods.or_else(|| {
        resolve_optional_string(None, ENV_MOODS_PATH, env).map(PathBuf::from)
    });
    let top_n = TopN::new(top_n)?;
    let index = IndexName::new(index)?;
    let algolia = resolve_algolia(algolia_app_id, algolia_api_key, index, env)?;

    Ok(AppConfig {
        catalog_path,
        top_n,
        algolia,
    })
}
