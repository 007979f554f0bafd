use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

use super::ArticleSource;
use crate::category::Category;
use crate::error::{Result, SourceError};
use crate::media::{normalize_image_url, pick_emoji};
use crate::models::{Article, SourceKind};
use crate::site::Site;
use crate::text::{strip_html, to_slug, truncate_excerpt};
use crate::EXCERPT_MAX_CHARS;

/// Upper bound on posts requested from the blog, whatever the caller asks.
pub const MAX_POSTS: usize = 500;
const PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct Tag {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct TermCategory {
    id: u64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Rendered {
    #[serde(default)]
    rendered: String,
}

#[derive(Debug, Deserialize)]
struct FeaturedMedia {
    #[serde(default)]
    source_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Embedded {
    #[serde(rename = "wp:featuredmedia", default)]
    featured_media: Vec<FeaturedMedia>,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    slug: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    modified: Option<String>,
    #[serde(default)]
    title: Rendered,
    #[serde(default)]
    excerpt: Rendered,
    #[serde(default)]
    categories: Vec<u64>,
    #[serde(rename = "_embedded", default)]
    embedded: Embedded,
}

/// Posts from the external blog that carry the site's tag. Their canonical
/// home stays on the blog, so they are emitted as reference articles.
pub struct WordPressSource {
    client: Client,
    api_base: String,
    tag_slug: String,
    site: Site,
}

impl WordPressSource {
    pub fn new(
        api_base: impl Into<String>,
        tag_slug: impl Into<String>,
        site: Site,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base: api_base.into(),
            tag_slug: tag_slug.into(),
            site,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, origin: &'static str) -> Result<T> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status { origin, status });
        }
        Ok(response.json::<T>().await?)
    }

    async fn find_tag_id(&self) -> Result<Option<u64>> {
        let url = format!(
            "{}/tags?slug={}&per_page=1",
            self.api_base,
            urlencoding::encode(&self.tag_slug)
        );
        let tags: Vec<Tag> = self.get_json(&url, "WordPress tags").await?;
        Ok(tags.first().map(|tag| tag.id))
    }

    async fn fetch_categories(&self) -> Result<HashMap<u64, String>> {
        let url = format!("{}/categories?per_page=100", self.api_base);
        let categories: Vec<TermCategory> = self.get_json(&url, "WordPress categories").await?;
        Ok(categories.into_iter().map(|c| (c.id, c.name)).collect())
    }

    /// Newest-first pages of tagged posts, stopping at `limit` posts, an
    /// empty page, or the out-of-range 400 WordPress sends past the end.
    async fn fetch_posts(&self, tag_id: u64, limit: usize) -> Result<Vec<Post>> {
        let max_pages = limit.div_ceil(PER_PAGE);
        let mut posts = Vec::new();

        for page in 1..=max_pages {
            let url = format!(
                "{}/posts?per_page={}&page={}&tags={}&_embed=true&orderby=date&order=desc",
                self.api_base, PER_PAGE, page, tag_id
            );

            let response = self.client.get(&url).send().await?;
            let status = response.status();
            if status == StatusCode::BAD_REQUEST {
                debug!("WordPress page {} is out of range; stopping", page);
                break;
            }
            if !status.is_success() {
                return Err(SourceError::Status {
                    origin: "WordPress posts",
                    status,
                });
            }

            let page_posts = response.json::<Vec<Post>>().await?;
            if page_posts.is_empty() {
                break;
            }
            posts.extend(page_posts);
            if posts.len() >= limit {
                break;
            }
        }

        posts.truncate(limit);
        Ok(posts)
    }

    fn transform_posts(&self, posts: Vec<Post>, categories: &HashMap<u64, String>) -> Vec<Article> {
        posts
            .into_iter()
            .map(|post| self.to_article(post, categories))
            .filter(|article| {
                let keep = article.is_complete();
                if !keep {
                    debug!("Skipping WordPress post without slug or title");
                }
                keep
            })
            .collect()
    }

    fn to_article(&self, post: Post, categories: &HashMap<u64, String>) -> Article {
        let source_category = post
            .categories
            .first()
            .and_then(|id| categories.get(id))
            .map(String::as_str)
            .unwrap_or_default();
        let category = Category::classify(source_category);

        let title = strip_html(&post.title.rendered);
        let slug = if post.slug.is_empty() {
            to_slug(&title)
        } else {
            post.slug
        };
        let description = strip_html(&post.excerpt.rendered);
        let image = post
            .embedded
            .featured_media
            .first()
            .and_then(|media| media.source_url.as_deref())
            .unwrap_or_default();

        Article {
            excerpt: truncate_excerpt(&description, EXCERPT_MAX_CHARS),
            llms_description: description,
            image: normalize_image_url(image, &self.site.fallback_image()),
            emoji: pick_emoji(&title, category.label()).to_string(),
            category: category.label().to_string(),
            category_slug: category.slug(),
            url: post.link.clone(),
            source_url: post.link,
            updated_at: post.modified.unwrap_or_else(|| post.date.clone()),
            published_at: post.date,
            source_kind: SourceKind::Reference,
            is_reference: true,
            title,
            slug,
        }
    }
}

#[async_trait]
impl ArticleSource for WordPressSource {
    fn name(&self) -> &'static str {
        "wordpress"
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<Article>> {
        let limit = limit.clamp(1, MAX_POSTS);

        let Some(tag_id) = self.find_tag_id().await? else {
            info!("WordPress tag '{}' not found; no posts to show", self.tag_slug);
            return Ok(Vec::new());
        };

        let (categories, posts) =
            futures::try_join!(self.fetch_categories(), self.fetch_posts(tag_id, limit))?;

        let articles = self.transform_posts(posts, &categories);
        info!("WordPress: {} reference posts", articles.len());
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_server::{Recorded, TestServer};
    use serde_json::{json, Value};

    fn source() -> WordPressSource {
        WordPressSource::new(
            "https://blog.example/wp-json/wp/v2",
            "growth-architect",
            Site::default(),
        )
        .unwrap()
    }

    fn categories() -> HashMap<u64, String> {
        HashMap::from([(7, "Blockchain".to_string()), (9, "Analytics".to_string())])
    }

    #[test]
    fn test_transform_posts() {
        let posts: Vec<Post> = serde_json::from_value(json!([
            {
                "id": 1,
                "slug": "web3-keeps-rediscovering-saas",
                "link": "https://blog.example/web3-keeps-rediscovering-saas/",
                "date": "2025-07-31T09:00:00",
                "modified": "2025-08-01T09:00:00",
                "title": {"rendered": "Web3 Keeps Rediscovering What SaaS Learned &#8211; Twice"},
                "excerpt": {"rendered": "<p>Why foundations get skipped&hellip;</p>\n"},
                "categories": [9, 7],
                "_embedded": {"wp:featuredmedia": [{"source_url": "https://blog.example/img/cover.png"}]}
            },
            {
                "id": 2,
                "slug": "",
                "link": "https://blog.example/no-slug/",
                "date": "2025-07-01T09:00:00",
                "title": {"rendered": "Cookie Consent Reality"},
                "excerpt": {"rendered": ""},
                "categories": []
            },
            {
                "id": 3,
                "slug": "untitled",
                "link": "https://blog.example/untitled/",
                "date": "2025-06-01T09:00:00",
                "title": {"rendered": "<span></span>"},
                "categories": [42]
            }
        ]))
        .unwrap();

        let articles = source().transform_posts(posts, &categories());
        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.slug, "web3-keeps-rediscovering-saas");
        assert_eq!(first.title, "Web3 Keeps Rediscovering What SaaS Learned \u{2013} Twice");
        assert_eq!(first.excerpt, "Why foundations get skipped...");
        assert_eq!(first.category, "Data & Attribution");
        assert_eq!(first.category_slug, "data-attribution");
        assert_eq!(first.emoji, "🌐");
        assert_eq!(first.image, "https://blog.example/img/cover.png");
        assert_eq!(first.url, "https://blog.example/web3-keeps-rediscovering-saas/");
        assert_eq!(first.source_url, first.url);
        assert_eq!(first.published_at, "2025-07-31T09:00:00");
        assert_eq!(first.updated_at, "2025-08-01T09:00:00");
        assert_eq!(first.source_kind, SourceKind::Reference);
        assert!(first.is_reference);

        let second = &articles[1];
        assert_eq!(second.slug, "cookie-consent-reality");
        assert_eq!(second.category, "Growth Strategy");
        assert_eq!(second.image, "https://kamilalipska.com/avatar.svg");
        assert_eq!(second.updated_at, second.published_at);
        assert_eq!(second.excerpt, "");
    }

    #[test]
    fn test_long_excerpt_is_truncated() {
        let long = "word ".repeat(100);
        let posts: Vec<Post> = serde_json::from_value(json!([{
            "slug": "long",
            "link": "https://blog.example/long/",
            "date": "2025-01-01T00:00:00",
            "title": {"rendered": "Long"},
            "excerpt": {"rendered": format!("<p>{}</p>", long)}
        }]))
        .unwrap();

        let articles = source().transform_posts(posts, &HashMap::new());
        let excerpt = &articles[0].excerpt;
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.chars().count() <= EXCERPT_MAX_CHARS + 3);
        assert!(articles[0].llms_description.chars().count() > EXCERPT_MAX_CHARS);
    }

    fn post_json(i: usize) -> Value {
        json!({
            "id": i,
            "slug": format!("post-{}", i),
            "link": format!("https://blog.example/post-{}/", i),
            "date": "2025-01-01T00:00:00",
            "title": {"rendered": format!("Post {}", i)},
            "excerpt": {"rendered": "<p>Body</p>"},
            "categories": [9]
        })
    }

    /// Tag 5 exists and exactly one full page of posts is available.
    fn one_page_blog(request: &Recorded) -> (u16, String) {
        match request.path() {
            "/tags" => (200, json!([{"id": 5}]).to_string()),
            "/categories" => (200, json!([{"id": 9, "name": "Analytics"}]).to_string()),
            "/posts" if request.query("page") == Some("1") => {
                let posts: Vec<Value> = (0..100).map(post_json).collect();
                (200, Value::Array(posts).to_string())
            }
            "/posts" => (
                400,
                json!({"code": "rest_post_invalid_page_number"}).to_string(),
            ),
            _ => (404, "{}".to_string()),
        }
    }

    fn remote(base: &str) -> WordPressSource {
        WordPressSource::new(base, "growth-architect", Site::default()).unwrap()
    }

    #[tokio::test]
    async fn test_out_of_range_page_ends_the_list() {
        let server = TestServer::start(one_page_blog).await;

        let articles = remote(&server.base).fetch(250).await.unwrap();
        assert_eq!(articles.len(), 100);
        assert_eq!(articles[0].category, "Data & Attribution");

        let pages: Vec<String> = server
            .requests_to("/posts")
            .iter()
            .filter_map(|request| request.query("page").map(str::to_string))
            .collect();
        assert_eq!(pages.len(), 2);
        assert!(pages.contains(&"1".to_string()));
        assert!(pages.contains(&"2".to_string()));

        for request in server.requests_to("/posts") {
            assert_eq!(request.query("tags"), Some("5"));
            assert_eq!(request.query("per_page"), Some("100"));
        }
    }

    #[tokio::test]
    async fn test_stops_paging_at_limit() {
        let server = TestServer::start(one_page_blog).await;

        let articles = remote(&server.base).fetch(50).await.unwrap();
        assert_eq!(articles.len(), 50);
        assert_eq!(server.requests_to("/posts").len(), 1);
    }

    #[tokio::test]
    async fn test_missing_tag_yields_empty() {
        let server = TestServer::start(|request| match request.path() {
            "/tags" => (200, "[]".to_string()),
            _ => (500, "{}".to_string()),
        })
        .await;

        let articles = remote(&server.base).fetch(24).await.unwrap();
        assert!(articles.is_empty());

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query("slug"), Some("growth-architect"));
    }

    #[tokio::test]
    async fn test_tag_lookup_error_propagates() {
        let server = TestServer::start(|_| (503, "{}".to_string())).await;

        let err = remote(&server.base).fetch(24).await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::Status { origin: "WordPress tags", status }
                if status == StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn test_category_error_propagates() {
        let server = TestServer::start(|request| match request.path() {
            "/categories" => (500, "{}".to_string()),
            _ => one_page_blog(request),
        })
        .await;

        let err = remote(&server.base).fetch(24).await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::Status { origin: "WordPress categories", .. }
        ));
    }
}
