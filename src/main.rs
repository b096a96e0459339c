//! # Folio CLI Application
//!
//! This module implements the command-line interface for the folio pipeline,
//! providing access to each stage through a set of subcommands.
//!
//! ## Key Components
//!
//! - CLI argument parsing with clap
//! - Subcommands for the pipeline stages:
//!   - `crawl`: Catalogue discovery and item page caching
//!   - `ingest`: Cached item pages into the catalog store
//!   - `embed` / `summarize`: Enrichment of items missing an attribute
//!   - `run`: All of the above in order
//! - Subcommands for reading the catalog:
//!   - `similar`: Nearest neighbours of an item
//!   - `list` / `show`: Filtered listings and item detail
//!   - `trends`: Catalog analytics
//!
//! The entry point owns the store handle and the model client and passes
//! them to the library explicitly.

mod telemetry;

use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use folio::catalog::analytics::{run_trend, TRENDS};
use folio::catalog::{Database, Item, ItemFilter};
use folio::crawler::storage::{Storage, StorageConfig};
use folio::crawler::{crawl_catalogue, CrawlReport, CrawlerConfig, DEFAULT_CATALOGUE_URL};
use folio::enrichment::{
    run_enrichment, EmbeddingEnricher, Enricher, EnrichmentConfig, EnrichmentReport,
    SummaryEnricher, DEFAULT_EMBEDDING_DIMENSIONS,
};
use folio::ingest::{ingest_cached, IngestReport};
use folio::model::GeminiClient;
use folio::search::{similar_items, DistanceMetric};
use indicatif::{ProgressBar, ProgressStyle};
use telemetry::OtelGuard;
use tokio::sync::mpsc;
use tracing::{info, instrument};

#[derive(Parser)]
#[command(author, version, about = "Book catalogue scraper with embeddings, summaries and similarity search", long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl the catalogue into the raw page cache
    Crawl(CrawlArgs),

    /// Load cached item pages into the catalog store
    Ingest(IngestArgs),

    /// Compute embeddings for items that lack one
    Embed(EmbedArgs),

    /// Generate summaries for items that lack one
    Summarize(SummarizeArgs),

    /// Crawl, ingest, embed and summarize in one go
    Run(RunArgs),

    /// Show the items closest to an item
    Similar(SimilarArgs),

    /// List catalog items
    List(ListArgs),

    /// Show one item with its summary
    Show(ShowArgs),

    /// Show catalog analytics
    Trends(TrendsArgs),
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// Database path
    #[arg(long, default_value = "catalog.db")]
    database: PathBuf,

    /// Embedding dimensions of the store
    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    dimensions: usize,
}

#[derive(Args, Debug)]
struct CacheArgs {
    /// Raw page cache directory
    #[arg(long, default_value = ".folio/raw_html")]
    cache_dir: PathBuf,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Use the free-tier API key and model
    #[arg(long)]
    free: bool,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    #[command(flatten)]
    cache: CacheArgs,

    /// Catalogue root URL
    #[arg(long, default_value = DEFAULT_CATALOGUE_URL)]
    catalogue_url: String,

    /// First catalogue page
    #[arg(long, default_value = "1")]
    start_page: u32,

    /// Last catalogue page
    #[arg(long, default_value = "50")]
    end_page: u32,

    /// Maximum concurrent requests
    #[arg(short, long, default_value = "10")]
    concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value = "10")]
    timeout: u64,
}

#[derive(Args, Debug)]
struct IngestArgs {
    #[command(flatten)]
    cache: CacheArgs,

    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Args, Debug)]
struct EmbedArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct SummarizeArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    model: ModelArgs,

    /// Maximum tokens per summary
    #[arg(long, default_value = "80")]
    max_tokens: u64,

    /// Sampling temperature
    #[arg(long, default_value = "0.8")]
    temperature: f64,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    crawl: CrawlArgs,

    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct SimilarArgs {
    /// Item id
    #[arg(required = true)]
    id: i64,

    /// Number of neighbours
    #[arg(short, default_value = "5")]
    k: usize,

    /// Distance function
    #[arg(short, long, value_enum, default_value_t = DistanceMetric::Cosine)]
    metric: DistanceMetric,

    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Items to skip
    #[arg(long, default_value = "0")]
    offset: u32,

    /// Page size (at most 100)
    #[arg(short, long)]
    limit: Option<u32>,

    /// Lowest price
    #[arg(long)]
    min_price: Option<f64>,

    /// Highest price
    #[arg(long)]
    max_price: Option<f64>,

    /// Lowest rating
    #[arg(long)]
    min_rating: Option<u8>,

    /// Category (partial match)
    #[arg(short, long)]
    category: Option<String>,

    /// Text to find in name or description
    #[arg(short, long)]
    q: Option<String>,
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Item id
    #[arg(required = true)]
    id: i64,

    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Args, Debug)]
struct TrendsArgs {
    /// Trend key; lists the available trends when omitted
    key: Option<String>,

    #[command(flatten)]
    store: StoreArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let _otel: OtelGuard = telemetry::init_tracing_subscriber()?;
    let format = cli.format;

    match cli.command {
        Some(Commands::Crawl(args)) => crawl_command(args, format).await?,
        Some(Commands::Ingest(args)) => ingest_command(args, format).await?,
        Some(Commands::Embed(args)) => embed_command(args, format).await?,
        Some(Commands::Summarize(args)) => summarize_command(args, format).await?,
        Some(Commands::Run(args)) => run_command(args, format).await?,
        Some(Commands::Similar(args)) => similar_command(args, format).await?,
        Some(Commands::List(args)) => list_command(args, format).await?,
        Some(Commands::Show(args)) => show_command(args, format).await?,
        Some(Commands::Trends(args)) => trends_command(args, format).await?,
        None => Cli::command().print_help()?,
    }

    Ok(())
}

async fn open_database(store: &StoreArgs) -> anyhow::Result<Database> {
    let path = store.database.to_string_lossy();
    Ok(Database::new_from_path(&path, store.dimensions).await?)
}

fn open_storage(cache_dir: &Path) -> Storage {
    Storage::with_config(StorageConfig {
        base_path: cache_dir.to_path_buf(),
    })
}

fn model_client(model: &ModelArgs, dimensions: usize) -> anyhow::Result<GeminiClient> {
    let client = if model.free {
        GeminiClient::new_gemini_free_from_env(dimensions)?
    } else {
        GeminiClient::new_gemini_from_env(dimensions)?
    };
    Ok(client)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_item(item: &Item) -> String {
    let price = item
        .price
        .map(|p| format!("£{:.2}", p))
        .unwrap_or_else(|| "-".to_string());
    let rating = item
        .rating
        .map(|r| format!("{}/5", r))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:>5}  {}  [{}, {}, {}]",
        item.id,
        item.name,
        price,
        rating,
        item.category.as_deref().unwrap_or("-")
    )
}

async fn crawl(args: &CrawlArgs) -> anyhow::Result<CrawlReport> {
    let config = CrawlerConfig::builder()
        .catalogue_url(args.catalogue_url.clone())
        .start_page(args.start_page)
        .end_page(args.end_page)
        .concurrency(args.concurrency)
        .timeout_secs(args.timeout)
        .user_agent(format!("folio/{}", env!("CARGO_PKG_VERSION")))
        .build();

    Ok(crawl_catalogue(&config, &open_storage(&args.cache.cache_dir)).await?)
}

/// Run one enrichment job behind a progress bar
async fn enrich_with_progress<J: Enricher>(
    db: &Database,
    job: &J,
) -> anyhow::Result<EnrichmentReport> {
    let field = J::FIELD.column();

    // Count the items to process up front for the bar length
    let total = db.items_missing(J::FIELD).await?.len();

    let (progress_sender, mut progress_receiver) = mpsc::channel(100);

    let progress_bar = ProgressBar::new(total as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );
    progress_bar.set_message(format!("Computing {}...", field));

    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            while let Some(item_id) = progress_receiver.recv().await {
                progress_bar.inc(1);
                progress_bar.set_message(format!("Processed item {}", item_id));
            }
            progress_bar.finish_with_message(format!("Finished {}", field));
        }
    });

    let result = run_enrichment(db, job, Some(progress_sender)).await;

    // The sender is dropped with the run, which ends the progress task
    progress_handle.await?;

    Ok(result?)
}

fn print_crawl_report(report: &CrawlReport) {
    println!(
        "Fetched {} catalogue pages, discovered {} item URLs, cached {} item pages",
        report.catalogue_pages_fetched, report.item_urls_discovered, report.item_pages_fetched
    );
}

fn print_ingest_report(report: &IngestReport) {
    println!(
        "Read {} pages, parsed {} records: {} inserted, {} skipped",
        report.pages_read, report.records_parsed, report.inserted, report.skipped
    );
}

fn print_enrichment_report(label: &str, report: &EnrichmentReport) {
    println!(
        "{}: {} pending, {} written ({} new, {} updated), {} conflicts, {} skipped",
        label,
        report.pending,
        report.written(),
        report.inserted,
        report.updated,
        report.conflicts,
        report.skipped
    );
}

#[instrument]
async fn crawl_command(args: CrawlArgs, format: OutputFormat) -> anyhow::Result<()> {
    let report = crawl(&args).await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_crawl_report(&report),
    }
    Ok(())
}

#[instrument]
async fn ingest_command(args: IngestArgs, format: OutputFormat) -> anyhow::Result<()> {
    let db = open_database(&args.store).await?;
    let report = ingest_cached(&open_storage(&args.cache.cache_dir), &db).await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_ingest_report(&report),
    }
    Ok(())
}

#[instrument]
async fn embed_command(args: EmbedArgs, format: OutputFormat) -> anyhow::Result<()> {
    let db = open_database(&args.store).await?;
    let client = model_client(&args.model, args.store.dimensions)?;

    let report =
        enrich_with_progress(&db, &EmbeddingEnricher::new(&client, args.store.dimensions)).await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_enrichment_report("Embeddings", &report),
    }
    Ok(())
}

#[instrument]
async fn summarize_command(args: SummarizeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let db = open_database(&args.store).await?;
    let client = model_client(&args.model, args.store.dimensions)?;
    let config = EnrichmentConfig::builder()
        .embedding_dimensions(args.store.dimensions)
        .summary_max_tokens(args.max_tokens)
        .summary_temperature(args.temperature)
        .build();

    let report = enrich_with_progress(&db, &SummaryEnricher::new(&client, &config)).await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_enrichment_report("Summaries", &report),
    }
    Ok(())
}

#[instrument]
async fn run_command(args: RunArgs, format: OutputFormat) -> anyhow::Result<()> {
    let crawl_report = crawl(&args.crawl).await?;
    info!("Crawl stage finished");

    let db = open_database(&args.store).await?;
    let ingest_report = ingest_cached(&open_storage(&args.crawl.cache.cache_dir), &db).await?;
    info!("Ingest stage finished");

    let dimensions = args.store.dimensions;
    let client = model_client(&args.model, dimensions)?;
    let config = EnrichmentConfig::builder()
        .embedding_dimensions(dimensions)
        .build();

    let embed_report =
        enrich_with_progress(&db, &EmbeddingEnricher::new(&client, dimensions)).await?;
    let summary_report = enrich_with_progress(&db, &SummaryEnricher::new(&client, &config)).await?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "crawl": crawl_report,
            "ingest": ingest_report,
            "embeddings": embed_report,
            "summaries": summary_report,
        }))?,
        OutputFormat::Text => {
            print_crawl_report(&crawl_report);
            print_ingest_report(&ingest_report);
            print_enrichment_report("Embeddings", &embed_report);
            print_enrichment_report("Summaries", &summary_report);
        }
    }
    Ok(())
}

#[instrument]
async fn similar_command(args: SimilarArgs, format: OutputFormat) -> anyhow::Result<()> {
    let db = open_database(&args.store).await?;
    let hits = similar_items(&db, args.id, args.k, args.metric).await?;

    match format {
        OutputFormat::Json => print_json(&hits)?,
        OutputFormat::Text => {
            if hits.is_empty() {
                println!("No neighbours for item {} (is it embedded?)", args.id);
            }
            for hit in &hits {
                let distance = hit
                    .distance
                    .map(|d| format!("{:.4}", d))
                    .unwrap_or_else(|| "   n/a".to_string());
                println!("{}  {}", distance, format_item(&hit.item));
            }
        }
    }
    Ok(())
}

#[instrument]
async fn list_command(args: ListArgs, format: OutputFormat) -> anyhow::Result<()> {
    let db = open_database(&args.store).await?;
    let filter = ItemFilter {
        offset: args.offset,
        limit: args.limit,
        min_price: args.min_price,
        max_price: args.max_price,
        min_rating: args.min_rating,
        category: args.category,
        q: args.q,
    };
    let items = db.list_items(&filter).await?;

    match format {
        OutputFormat::Json => print_json(&items)?,
        OutputFormat::Text => {
            println!("Items: {}", items.len());
            for item in &items {
                println!("{}", format_item(item));
            }
        }
    }
    Ok(())
}

#[instrument]
async fn show_command(args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let db = open_database(&args.store).await?;
    let detail = db
        .get_item(args.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No item with id {}", args.id))?;

    match format {
        OutputFormat::Json => print_json(&detail)?,
        OutputFormat::Text => {
            let item = &detail.item;
            println!("{}", format_item(item));
            if let Some(code) = &item.external_code {
                println!("Code: {}", code);
            }
            if let Some(availability) = &item.availability {
                println!("Availability: {}", availability);
            }
            println!("Embedded: {}", if detail.has_embedding { "yes" } else { "no" });
            if let Some(summary) = &detail.summary {
                println!("\nSummary:\n{}", summary);
            }
            if let Some(description) = &item.description {
                println!("\nDescription:\n{}", description);
            }
        }
    }
    Ok(())
}

#[instrument]
async fn trends_command(args: TrendsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let Some(key) = args.key else {
        match format {
            OutputFormat::Json => print_json(&TRENDS)?,
            OutputFormat::Text => {
                for trend in &TRENDS {
                    println!("{:<36} {}", trend.key, trend.description);
                }
            }
        }
        return Ok(());
    };

    let db = open_database(&args.store).await?;
    let value = run_trend(&db, &key).await?;

    if format == OutputFormat::Text {
        if let Some(trend) = TRENDS.iter().find(|t| t.key == key) {
            println!("{}", trend.name);
        }
    }
    print_json(&value)
}
