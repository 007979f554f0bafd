use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::ArticleSource;
use crate::category::Category;
use crate::error::Result;
use crate::media::{normalize_image_url, pick_emoji};
use crate::models::{Article, SourceKind};
use crate::site::Site;
use crate::text::{strip_html, to_slug, truncate_excerpt};
use crate::EXCERPT_MAX_CHARS;

/// One entry of the local posts file. Only `slug`, `title`, `excerpt` and
/// `date` are expected; the rest are optional extras.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalPost {
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    primary_keyword: Option<String>,
    #[serde(default)]
    publish_decision: Option<Value>,
    #[serde(default)]
    publish: Option<Value>,
    #[serde(default)]
    approved: Option<Value>,
}

impl LocalPost {
    /// The first approval field that is present and not null.
    fn decision(&self) -> Option<&Value> {
        [&self.publish_decision, &self.publish, &self.approved]
            .into_iter()
            .flatten()
            .find(|value| !value.is_null())
    }
}

/// Accepts `publish`, `approved`, `true` or `yes` in any case.
pub fn is_publish_approved(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "publish" | "approved" | "true" | "yes"
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn value_is_approved(value: &Value) -> bool {
    match value {
        Value::String(s) => is_publish_approved(s),
        Value::Bool(b) => *b,
        _ => false,
    }
}

/// Reads hand-curated insights from a JSON array on disk.
///
/// This source never fails: a missing or unreadable file yields no articles.
pub struct LocalFileSource {
    path: PathBuf,
    site: Site,
}

impl LocalFileSource {
    pub fn new(path: impl Into<PathBuf>, site: Site) -> Self {
        Self {
            path: path.into(),
            site,
        }
    }

    async fn read_records(&self) -> Result<Vec<Value>> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let parsed: Value = serde_json::from_str(&raw)?;

        match parsed {
            Value::Array(records) => Ok(records),
            _ => {
                warn!(
                    "Local posts file {} is not a JSON array; ignoring it",
                    self.path.display()
                );
                Ok(Vec::new())
            }
        }
    }

    /// Filters and maps raw records. Records that do not deserialize, are
    /// not approved, or lack a slug or title are skipped.
    pub fn transform_records(&self, records: Vec<Value>) -> Vec<Article> {
        records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<LocalPost>(record) {
                Ok(post) => Some(post),
                Err(e) => {
                    debug!("Skipping malformed local post: {}", e);
                    None
                }
            })
            .filter(|post| post.decision().is_some_and(value_is_approved))
            .map(|post| self.to_article(post))
            .filter(|article| {
                let keep = article.is_complete();
                if !keep {
                    debug!("Skipping local post without slug or title");
                }
                keep
            })
            .collect()
    }

    fn to_article(&self, post: LocalPost) -> Article {
        let title = strip_html(post.title.as_deref().unwrap_or_default());
        let slug = post
            .slug
            .map(|s| to_slug(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| to_slug(&title));

        let category_raw = non_blank(post.primary_keyword)
            .or_else(|| non_blank(post.category))
            .unwrap_or_else(|| "Growth Strategy".to_string());
        let category = Category::classify(&category_raw);

        let description = strip_html(post.excerpt.as_deref().unwrap_or_default());
        let published_at = non_blank(post.date).unwrap_or_else(|| Utc::now().to_rfc3339());

        Article {
            url: self.site.insight_url(&slug),
            excerpt: truncate_excerpt(&description, EXCERPT_MAX_CHARS),
            llms_description: description,
            image: normalize_image_url(
                post.image.as_deref().unwrap_or_default(),
                &self.site.fallback_image(),
            ),
            emoji: pick_emoji(&title, category.label()).to_string(),
            category: category.label().to_string(),
            category_slug: category.slug(),
            source_url: String::new(),
            updated_at: published_at.clone(),
            published_at,
            source_kind: SourceKind::Native,
            is_reference: false,
            title,
            slug,
        }
    }
}

#[async_trait]
impl ArticleSource for LocalFileSource {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch(&self, _limit: usize) -> Result<Vec<Article>> {
        let records = match self.read_records().await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "Could not read local posts from {}: {}",
                    self.path.display(),
                    e
                );
                return Ok(Vec::new());
            }
        };

        let articles = self.transform_records(records);
        info!(
            "Loaded {} approved local posts from {}",
            articles.len(),
            self.path.display()
        );
        Ok(articles)
    }
}
