use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use newswire_core::{AppConfig, CrawlJob, FetchOutcome};
use newswire_worker::{
    AggregateRequest, CrawlQueue, CrawlWorker, NewsService, RunController, Scheduler,
    DEFAULT_PAGE_SIZE,
};
use tracing_subscriber::EnvFilter;

/// How long `run` waits for the crawl worker to finish queued jobs on shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(name = "newswire")]
#[command(about = "News feed aggregator and summarizer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the periodic aggregator and crawl worker until interrupted
    Run,
    /// Aggregate once and print the result as JSON
    Aggregate {
        #[arg(long)]
        category: Option<String>,
        /// Substring of the source URL
        #[arg(long)]
        source: Option<String>,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: usize,
        /// Attach AI summaries to each item
        #[arg(long)]
        summaries: bool,
    },
    /// Fetch a single source by slug or URL
    Crawl { source_id: String },
    /// Summarize a block of text
    Summarize { text: String },
    /// Send a chat message
    Chat { message: String },
    /// List configured sources
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = newswire_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let registry = Arc::new(newswire_core::load_registry(config.sources_path.as_deref())?);
    tracing::info!(env = %config.env, sources = registry.len(), "configuration loaded");

    let service = NewsService::from_config(&config, Arc::clone(&registry))?;

    match cli.command {
        Commands::Run => run_daemon(service, &config).await?,
        Commands::Aggregate {
            category,
            source,
            limit,
            summaries,
        } => {
            let request = AggregateRequest {
                category,
                source,
                limit,
                include_summaries: summaries,
            };
            print_json(&service.aggregate(&request).await)?;
        }
        Commands::Crawl { source_id } => {
            let value = match service.crawl(&source_id).await {
                Some(FetchOutcome::Ok(items)) => {
                    serde_json::json!({ "status": "success", "items": items })
                }
                Some(FetchOutcome::Error {
                    source_domain,
                    message,
                }) => serde_json::json!({
                    "status": "failure",
                    "source_domain": source_domain,
                    "error": message,
                }),
                None => anyhow::bail!("unknown source '{source_id}'; see `newswire sources`"),
            };
            print_json(&value)?;
        }
        Commands::Summarize { text } => print_json(&service.summarize(&text).await)?,
        Commands::Chat { message } => print_json(&service.chat(&message).await)?,
        Commands::Sources => {
            let listing: Vec<_> = registry
                .sources()
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "slug": s.slug(),
                        "name": s.display_name,
                        "url": s.url,
                        "categories": s.category_keywords,
                    })
                })
                .collect();
            print_json(&listing)?;
        }
    }

    Ok(())
}

async fn run_daemon(service: NewsService, config: &AppConfig) -> anyhow::Result<()> {
    let controller = RunController::new(Arc::new(service));
    let scheduler = Scheduler::start(controller.clone(), config.schedule_interval).await?;

    let (queue, rx) = CrawlQueue::channel(config.crawl_queue_capacity);
    let worker = tokio::spawn(CrawlWorker::new(controller, rx).run());
    queue.enqueue(CrawlJob::all()).await?;

    shutdown_signal().await;

    scheduler.shutdown().await?;
    drop(queue);
    if tokio::time::timeout(DRAIN_TIMEOUT, worker).await.is_err() {
        tracing::warn!("crawl worker did not drain before timeout; exiting");
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
