//! carrot-discovery: run topic discovery for a patch from the command line
//!
//! ```bash
//! carrot-discovery run --patch-id p1 --topic "Golden Gate Bridge" \
//!     --vetter-url http://localhost:8080/vet --angle history --angle engineering
//! carrot-discovery backfill-heroes --patch-id p1
//! ```
//!
//! Events are written to stdout as JSON lines; logs go to stderr (`RUST_LOG`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use tokio::sync::broadcast::error::RecvError;

use carrot_discovery::canonical::Canonicalizer;
use carrot_discovery::config::DiscoveryConfig;
use carrot_discovery::dedup::SqliteDedupState;
use carrot_discovery::discovery_engine::{DiscoveryEngine, RunPlan, RunStatus, StopHandle};
use carrot_discovery::discovery_events::ShutdownReason;
use carrot_discovery::frontier::SearchCandidate;
use carrot_discovery::hero::{CommonsClient, HeroPipeline, HttpImageGenerator};
use carrot_discovery::page_fetcher::HttpPageFetcher;
use carrot_discovery::sources::{
    HttpSourceResolver, arxiv_candidate, news_candidate, rss_candidate, wikipedia_candidate,
};
use carrot_discovery::store::SqliteStore;
use carrot_discovery::vetting::{HttpVetter, VetError, VetRequest, VetVerdict, Vetter};

#[derive(Parser)]
#[command(name = "carrot-discovery", version, about)]
struct Cli {
    /// SQLite database holding discovered items
    #[arg(long, env = "CARROT_DB", default_value = "carrot_discovery.db", global = true)]
    db: PathBuf,

    /// Image generation service base URL; heroes fall back to Commons without it
    #[arg(long, env = "CARROT_IMAGE_URL", global = true)]
    image_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discover items for a patch
    Run(RunArgs),
    /// Retry hero images for items still on a placeholder
    BackfillHeroes {
        #[arg(long)]
        patch_id: String,

        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    Wikipedia,
    News,
    Arxiv,
}

#[derive(clap::Args)]
struct RunArgs {
    #[arg(long)]
    patch_id: String,

    #[arg(long)]
    topic: String,

    /// Other names the topic goes by
    #[arg(long = "alias")]
    aliases: Vec<String>,

    /// Relevance scoring endpoint
    #[arg(long, env = "CARROT_VETTER_URL")]
    vetter_url: String,

    /// Search sources seeded from the topic
    #[arg(long, value_enum, value_delimiter = ',', default_value = "wikipedia,news,arxiv")]
    sources: Vec<Source>,

    /// RSS or Atom feeds to seed
    #[arg(long = "feed")]
    feeds: Vec<String>,

    /// Pages to fetch directly, ahead of searches
    #[arg(long = "url")]
    urls: Vec<String>,

    /// Extra search angles used once the seeds run dry
    #[arg(long = "angle")]
    angles: Vec<String>,

    #[arg(long, default_value_t = 10)]
    max_items: usize,

    #[arg(long, default_value_t = 300)]
    run_timeout_secs: u64,

    #[arg(long, default_value_t = 2.0)]
    crawl_rate_rps: f64,

    /// Entities hero image searches should prefer
    #[arg(long = "entity")]
    known_entities: Vec<String>,

    /// Remember seen URLs across runs
    #[arg(long)]
    durable_dedup: bool,

    /// Follow redirects when canonicalizing URLs
    #[arg(long)]
    resolve_redirects: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let store = Arc::new(
        SqliteStore::open(&cli.db)
            .await
            .with_context(|| format!("Failed to open {}", cli.db.display()))?,
    );

    match cli.command {
        Command::Run(args) => run(store, cli.db, cli.image_url, args).await,
        Command::BackfillHeroes { patch_id, limit } => {
            let config = DiscoveryConfig::builder()
                .patch_id(&patch_id)
                .topic(&patch_id)
                .build()?;
            let engine = DiscoveryEngine::new(
                store.clone(),
                Arc::new(HttpSourceResolver::new(config.fetch_timeout(), config.page_size() as usize)?),
                Arc::new(HttpPageFetcher::new(config.fetch_timeout())?),
                Arc::new(NoVetter),
            )
            .with_hero_pipeline(hero_pipeline(&config, cli.image_url.as_deref())?);
            let upgraded = engine.backfill_heroes(&patch_id, limit).await?;
            println!("{}", serde_json::json!({ "patch_id": patch_id, "upgraded": upgraded }));
            Ok(())
        }
    }
}

async fn run(
    store: Arc<SqliteStore>,
    db: PathBuf,
    image_url: Option<String>,
    args: RunArgs,
) -> Result<()> {
    let config = DiscoveryConfig::builder()
        .patch_id(&args.patch_id)
        .topic(&args.topic)
        .aliases(args.aliases.clone())
        .max_items(args.max_items)
        .run_timeout_secs(args.run_timeout_secs)
        .crawl_rate_rps(args.crawl_rate_rps)
        .known_entities(args.known_entities.clone())
        .build()?;

    let canonicalizer = if args.resolve_redirects {
        Canonicalizer::new(config.canonicalize_timeout())?
    } else {
        Canonicalizer::syntactic()
    };
    let vetter = HttpVetter::new(args.vetter_url.clone(), config.vet_timeout())?;

    let mut engine = DiscoveryEngine::new(
        store.clone(),
        Arc::new(HttpSourceResolver::new(config.fetch_timeout(), config.page_size() as usize)?),
        Arc::new(HttpPageFetcher::new(config.fetch_timeout())?),
        Arc::new(vetter),
    )
    .with_canonicalizer(canonicalizer)
    .with_hero_pipeline(hero_pipeline(&config, image_url.as_deref())?);

    if args.durable_dedup {
        let durable = SqliteDedupState::open(&db).await?;
        match durable.prune_expired().await {
            Ok(pruned) if pruned > 0 => info!("Pruned {pruned} expired dedup entries"),
            Ok(_) => {}
            Err(e) => warn!("Failed to prune dedup entries: {e:#}"),
        }
        engine = engine.with_durable_dedup(durable);
    }

    let plan = RunPlan::new(config.clone(), seeds(&args, &config)).with_angles(args.angles);

    let mut events = engine.events().subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!("Failed to serialize event: {e}"),
                },
                Err(RecvError::Lagged(missed)) => warn!("Event output fell behind, {missed} events lost"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let stop = StopHandle::new();
    let ctrl_c = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current step");
            ctrl_c.stop();
        }
    });

    let run_id = uuid::Uuid::new_v4().to_string();
    let outcome = engine.run(run_id, plan, stop).await;

    let reason = match &outcome {
        Ok(summary) if summary.status == RunStatus::Stopped => ShutdownReason::Cancelled,
        Ok(_) => ShutdownReason::RunFinished,
        Err(e) => ShutdownReason::Error(e.to_string()),
    };
    engine.events().shutdown_gracefully(reason).await;
    drop(engine);
    if let Err(e) = printer.await {
        warn!("Event printer failed: {e}");
    }

    let summary = outcome?;
    eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn seeds(args: &RunArgs, config: &DiscoveryConfig) -> Vec<SearchCandidate> {
    let mut seeds: Vec<SearchCandidate> = args.urls.iter().map(SearchCandidate::direct).collect();
    for source in &args.sources {
        seeds.push(match source {
            Source::Wikipedia => wikipedia_candidate(config.topic(), config.page_size()),
            Source::News => news_candidate(config.topic()),
            Source::Arxiv => arxiv_candidate(config.topic(), config.page_size()),
        });
    }
    seeds.extend(args.feeds.iter().map(|feed| rss_candidate(feed)));
    seeds
}

fn hero_pipeline(config: &DiscoveryConfig, image_url: Option<&str>) -> Result<HeroPipeline> {
    let mut pipeline = HeroPipeline::new()
        .with_wikimedia(Arc::new(CommonsClient::new(config.fetch_timeout())?))
        .known_entities(config.known_entities().to_vec())
        .ai_timeout(config.hero_ai_timeout())
        .style(config.hero_style());
    if let Some(url) = image_url {
        pipeline = pipeline.with_generator(Arc::new(HttpImageGenerator::new(url, config.hero_ai_timeout())?));
    }
    Ok(pipeline)
}

/// Backfill never vets; the engine still needs a vetter to exist.
struct NoVetter;

#[async_trait::async_trait]
impl Vetter for NoVetter {
    async fn vet(&self, _request: VetRequest) -> std::result::Result<VetVerdict, VetError> {
        Err(VetError::Rejected {
            reason: "vetting is disabled for hero backfill".to_string(),
        })
    }
}
