use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::models::Article;
use crate::sources::wordpress::MAX_POSTS;
use crate::sources::{ArticleSource, LocalFileSource, NotionSource, WordPressSource};

pub const DEFAULT_LIMIT: usize = 24;

/// Merges the configured sources into one deduplicated, newest-first feed.
///
/// The local file always contributes. Notion is authoritative when it has
/// anything to offer; otherwise WordPress fills in. On slug collisions the
/// earlier group wins: local, then whichever remote source was used.
pub struct Aggregator {
    local: Box<dyn ArticleSource>,
    primary: Box<dyn ArticleSource>,
    fallback: Box<dyn ArticleSource>,
}

impl Aggregator {
    pub fn new(
        local: Box<dyn ArticleSource>,
        primary: Box<dyn ArticleSource>,
        fallback: Box<dyn ArticleSource>,
    ) -> Self {
        Self {
            local,
            primary,
            fallback,
        }
    }

    /// Builds the production wiring: posts file, Notion, WordPress.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let local = LocalFileSource::new(config.posts_path.clone(), config.site.clone());
        let notion = NotionSource::new(config.notion.clone(), config.site.clone())?;
        if !notion.is_configured() {
            info!("Notion credentials not set; WordPress will be the only remote source");
        }
        let wordpress = WordPressSource::new(
            config.wordpress_api_base.clone(),
            config.wordpress_tag_slug.clone(),
            config.site.clone(),
        )?;

        Ok(Self::new(Box::new(local), Box::new(notion), Box::new(wordpress)))
    }

    /// Returns at most `limit` published articles, newest first.
    ///
    /// A failing primary source is logged and treated as empty. A failing
    /// fallback source is returned to the caller.
    pub async fn get_published_articles(&self, limit: usize) -> Result<Vec<Article>> {
        let local = self.local.fetch(limit).await?;

        match self.primary.fetch(limit).await {
            Ok(primary) if !primary.is_empty() => {
                info!(
                    "Using {} as primary source ({} articles)",
                    self.primary.name(),
                    primary.len()
                );
                return Ok(finalize(merge_prefer_first([local, primary]), limit));
            }
            Ok(_) => {
                info!(
                    "{} returned no articles; falling back to {}",
                    self.primary.name(),
                    self.fallback.name()
                );
            }
            Err(e) => {
                warn!(
                    "{} content source failed, falling back to {}: {}",
                    self.primary.name(),
                    self.fallback.name(),
                    e
                );
            }
        }

        let fallback = self.fallback.fetch(limit.min(MAX_POSTS)).await?;
        Ok(finalize(merge_prefer_first([local, fallback]), limit))
    }

    /// Finds one article in the largest feed the sources will produce.
    pub async fn get_article_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Ok(None);
        }

        let articles = self.get_published_articles(MAX_POSTS).await?;
        Ok(articles.into_iter().find(|article| article.slug == slug))
    }
}

fn finalize(mut articles: Vec<Article>, limit: usize) -> Vec<Article> {
    sort_newest_first(&mut articles);
    articles.truncate(limit);
    articles
}

/// Concatenates `groups` keeping only the first article seen for each slug.
/// Articles with an empty slug are dropped.
pub fn merge_prefer_first<I>(groups: I) -> Vec<Article>
where
    I: IntoIterator<Item = Vec<Article>>,
{
    let mut seen = HashSet::new();
    groups
        .into_iter()
        .flatten()
        .filter(|article| !article.slug.is_empty() && seen.insert(article.slug.clone()))
        .collect()
}

/// Milliseconds since the epoch for the date formats the sources emit.
/// Missing or unparseable dates count as the epoch itself.
pub fn published_timestamp(value: &str) -> i64 {
    let value = value.trim();
    if value.is_empty() {
        return 0;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.timestamp_millis();
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return dt.and_utc().timestamp_millis();
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0)
}

/// Stable sort by `published_at`, newest first.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by_cached_key(|article| std::cmp::Reverse(published_timestamp(&article.published_at)));
}
