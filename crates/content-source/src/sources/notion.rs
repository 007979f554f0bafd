use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use super::local::is_publish_approved;
use super::ArticleSource;
use crate::category::Category;
use crate::config::NotionCredentials;
use crate::error::{Result, SourceError};
use crate::media::{normalize_image_url, pick_emoji};
use crate::models::{Article, SourceKind};
use crate::site::Site;
use crate::text::{decode_html_entities, to_slug, truncate_excerpt};
use crate::EXCERPT_MAX_CHARS;

const NOTION_API_BASE: &str = "https://api.notion.com/v1";
const NOTION_API_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;

/// Property names accepted for each logical field, in lookup order.
struct FieldAliases;

impl FieldAliases {
    const DECISION: &'static [&'static str] =
        &["Publish Decision", "Publishing Decision", "Publish"];
    const STAGE: &'static [&'static str] = &["Stage", "Status"];
    const DESTINATION: &'static [&'static str] = &["Destination website", "Website"];
    const TITLE: &'static [&'static str] = &["Title", "Name"];
    const SLUG: &'static [&'static str] = &["Slug"];
    const CATEGORY: &'static [&'static str] = &["Category", "Tags", "Topic"];
    const LLMS_DESCRIPTION: &'static [&'static str] = &["LLMs Description", "LLM Description"];
    const EXCERPT: &'static [&'static str] = &["Excerpt"];
    const SOURCE_URL: &'static [&'static str] = &["URL"];
    const IMAGE: &'static [&'static str] = &["Image"];
    const PUBLISHED_AT: &'static [&'static str] = &["Published At"];
}

#[derive(Debug, Deserialize)]
struct PlainText {
    #[serde(default)]
    plain_text: String,
}

#[derive(Debug, Deserialize)]
struct NamedOption {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct DateValue {
    #[serde(default)]
    start: Option<String>,
}

/// The property value shapes the publishing database uses.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum NotionProperty {
    Title {
        #[serde(default)]
        title: Vec<PlainText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<PlainText>,
    },
    Select {
        #[serde(default)]
        select: Option<NamedOption>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<NamedOption>,
    },
    Status {
        #[serde(default)]
        status: Option<NamedOption>,
    },
    Url {
        #[serde(default)]
        url: Option<String>,
    },
    Checkbox {
        #[serde(default)]
        checkbox: bool,
    },
    Date {
        #[serde(default)]
        date: Option<DateValue>,
    },
    #[serde(other)]
    Unsupported,
}

impl NotionProperty {
    fn text(&self) -> String {
        match self {
            NotionProperty::Title { title: parts } | NotionProperty::RichText { rich_text: parts } => {
                let joined: String = parts.iter().map(|p| p.plain_text.as_str()).collect();
                decode_html_entities(joined.trim())
            }
            NotionProperty::Select { select } | NotionProperty::Status { status: select } => select
                .as_ref()
                .map(|option| decode_html_entities(&option.name))
                .unwrap_or_default(),
            NotionProperty::MultiSelect { multi_select } => decode_html_entities(
                &multi_select
                    .iter()
                    .map(|option| option.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            NotionProperty::Url { url } => url.clone().unwrap_or_default(),
            NotionProperty::Checkbox { checkbox } => checkbox.to_string(),
            NotionProperty::Date { .. } | NotionProperty::Unsupported => String::new(),
        }
    }

    fn date(&self) -> String {
        match self {
            NotionProperty::Date { date: Some(value) } => value.start.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NotionPage {
    #[serde(default)]
    created_time: Option<String>,
    #[serde(default)]
    last_edited_time: Option<String>,
    #[serde(default)]
    properties: HashMap<String, NotionProperty>,
}

impl NotionPage {
    /// Exact property name first, then a case-insensitive match.
    fn property(&self, name: &str) -> Option<&NotionProperty> {
        self.properties.get(name).or_else(|| {
            self.properties
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    /// First non-empty text among `aliases`.
    fn text(&self, aliases: &[&str]) -> String {
        aliases
            .iter()
            .filter_map(|name| self.property(name))
            .map(NotionProperty::text)
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    }

    fn date(&self, aliases: &[&str]) -> String {
        aliases
            .iter()
            .filter_map(|name| self.property(name))
            .map(NotionProperty::date)
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    }
}

/// A database page with every aliased field resolved once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotionRecord {
    pub decision: String,
    pub stage: String,
    pub destination: String,
    pub title: String,
    pub slug: String,
    pub category: String,
    pub llms_description: String,
    pub excerpt: String,
    pub source_url: String,
    pub image: String,
    pub published_at: String,
    pub updated_at: String,
}

impl NotionRecord {
    fn resolve(page: &NotionPage) -> Self {
        let published_at = Some(page.date(FieldAliases::PUBLISHED_AT))
            .filter(|value| !value.is_empty())
            .or_else(|| page.created_time.clone())
            .unwrap_or_default();
        let updated_at = page
            .last_edited_time
            .clone()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| published_at.clone());

        Self {
            decision: page.text(FieldAliases::DECISION),
            stage: page.text(FieldAliases::STAGE),
            destination: page.text(FieldAliases::DESTINATION),
            title: page.text(FieldAliases::TITLE),
            slug: page.text(FieldAliases::SLUG),
            category: page.text(FieldAliases::CATEGORY),
            llms_description: page.text(FieldAliases::LLMS_DESCRIPTION),
            excerpt: page.text(FieldAliases::EXCERPT),
            source_url: page.text(FieldAliases::SOURCE_URL),
            image: page.text(FieldAliases::IMAGE),
            published_at,
            updated_at,
        }
    }

    /// Approved, published, and addressed to `domain`. All three must hold.
    pub fn passes_gate(&self, domain: &str) -> bool {
        is_publish_approved(&self.decision)
            && self.stage.trim().to_lowercase() == "published"
            && self
                .destination
                .to_lowercase()
                .contains(&domain.to_lowercase())
    }

    fn into_article(self, site: &Site) -> Article {
        let slug = Some(to_slug(&self.slug))
            .filter(|slug| !slug.is_empty())
            .unwrap_or_else(|| to_slug(&self.title));
        let category = Category::classify(&self.category);
        let excerpt_source = if self.excerpt.is_empty() {
            &self.llms_description
        } else {
            &self.excerpt
        };
        let excerpt = truncate_excerpt(excerpt_source, EXCERPT_MAX_CHARS);
        let llms_description = if self.llms_description.is_empty() {
            excerpt.clone()
        } else {
            self.llms_description
        };

        Article {
            url: site.insight_url(&slug),
            emoji: pick_emoji(&self.title, category.label()).to_string(),
            image: normalize_image_url(&self.image, &site.fallback_image()),
            category: category.label().to_string(),
            category_slug: category.slug(),
            excerpt,
            llms_description,
            source_url: self.source_url,
            published_at: self.published_at,
            updated_at: self.updated_at,
            source_kind: SourceKind::Notion,
            is_reference: false,
            title: self.title,
            slug,
        }
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<NotionPage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// The Notion publishing database: the primary structured source.
pub struct NotionSource {
    client: Client,
    api_base: String,
    credentials: Option<NotionCredentials>,
    site: Site,
}

impl NotionSource {
    pub fn new(credentials: Option<NotionCredentials>, site: Site) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base: NOTION_API_BASE.to_string(),
            credentials,
            site,
        })
    }

    /// Points the source at another API root, e.g. a regional proxy.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Pages through the whole database before anything is filtered.
    async fn query_all(&self, credentials: &NotionCredentials) -> Result<Vec<NotionPage>> {
        let url = format!(
            "{}/databases/{}/query",
            self.api_base,
            urlencoding::encode(&credentials.database_id)
        );
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = QueryRequest {
                page_size: PAGE_SIZE,
                start_cursor: cursor.as_deref(),
            };

            let response = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", credentials.api_key))
                .header("Notion-Version", NOTION_API_VERSION)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(SourceError::Status {
                    origin: "Notion query",
                    status,
                });
            }

            let payload = response.json::<QueryResponse>().await?;
            debug!("Notion returned {} pages", payload.results.len());
            pages.extend(payload.results);

            match payload.next_cursor {
                Some(next) if payload.has_more && !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(pages)
    }

    /// Applies the publishing gate and maps surviving pages to articles.
    fn transform_pages(&self, pages: Vec<NotionPage>) -> Vec<Article> {
        pages
            .iter()
            .map(NotionRecord::resolve)
            .filter(|record| record.passes_gate(&self.site.domain))
            .map(|record| record.into_article(&self.site))
            .filter(|article| {
                let keep = article.is_complete();
                if !keep {
                    debug!("Skipping Notion page without slug or title");
                }
                keep
            })
            .collect()
    }
}

#[async_trait]
impl ArticleSource for NotionSource {
    fn name(&self) -> &'static str {
        "notion"
    }

    async fn fetch(&self, _limit: usize) -> Result<Vec<Article>> {
        let Some(credentials) = &self.credentials else {
            debug!("Notion credentials not configured; skipping");
            return Ok(Vec::new());
        };

        let pages = self.query_all(credentials).await?;
        let total = pages.len();
        let articles = self.transform_pages(pages);
        info!(
            "Notion: {} of {} pages passed the publishing gate",
            articles.len(),
            total
        );
        Ok(articles)
    }
}
