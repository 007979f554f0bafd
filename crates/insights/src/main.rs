use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use content_source::{render, Aggregator, Article, Config, DEFAULT_LIMIT};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest feed the sitemap and llms.txt are built from.
const FULL_FEED_LIMIT: usize = 500;

#[derive(Parser)]
#[command(name = "insights")]
#[command(about = "Aggregate published insights from the posts file, Notion and WordPress")]
struct Args {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the merged article feed as JSON
    Feed {
        /// Maximum number of articles
        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Print the XML sitemap
    Sitemap,
    /// Print the llms.txt discovery listing
    Llms,
    /// Print one article as JSON, or its external URL for reference posts
    Show {
        /// Article slug
        slug: String,
    },
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("content_source={},insights={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn published(aggregator: &Aggregator, limit: usize) -> Result<Vec<Article>> {
    aggregator.get_published_articles(limit).await.map_err(|e| {
        error!("Content sources failed: {}", e);
        anyhow::anyhow!("Content is temporarily unavailable")
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::from_env()?;
    let aggregator = Aggregator::from_config(&config)?;

    match args.command {
        Command::Feed { limit } => {
            let articles = published(&aggregator, limit).await?;
            let json =
                serde_json::to_string_pretty(&articles).context("Failed to serialize feed")?;
            println!("{}", json);
        }
        Command::Sitemap => {
            let articles = published(&aggregator, FULL_FEED_LIMIT).await?;
            let xml = render::sitemap(&config.site.static_urls(), &articles, Utc::now());
            print!("{}", xml);
        }
        Command::Llms => {
            let articles = published(&aggregator, FULL_FEED_LIMIT).await?;
            print!("{}", render::llms_txt(&config.site, &articles));
        }
        Command::Show { slug } => {
            let article = aggregator.get_article_by_slug(&slug).await.map_err(|e| {
                error!("Content sources failed: {}", e);
                anyhow::anyhow!("Content is temporarily unavailable")
            })?;

            let Some(article) = article else {
                anyhow::bail!("Insight not found: {}", slug);
            };

            // Reference posts live on the external blog.
            if article.is_reference && !article.source_url.is_empty() {
                println!("{}", article.source_url);
            } else {
                let json = serde_json::to_string_pretty(&article)
                    .context("Failed to serialize article")?;
                println!("{}", json);
            }
        }
    }

    Ok(())
}
