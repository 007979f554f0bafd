use anyhow::{Context, Result};
use url::Url;

pub const DEFAULT_SITE_URL: &str = "https://kamilalipska.com";

/// The portfolio site the feed is published on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// Origin without a trailing slash, e.g. `https://kamilalipska.com`.
    pub url: String,
    /// Bare host used to recognise content destined for this site.
    pub domain: String,
}

impl Site {
    pub fn parse(site_url: &str) -> Result<Self> {
        let parsed = Url::parse(site_url.trim())
            .with_context(|| format!("SITE_URL is not a valid URL: {}", site_url))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("SITE_URL must use http or https: {}", site_url);
        }

        let host = parsed
            .host_str()
            .with_context(|| format!("SITE_URL has no host: {}", site_url))?;
        let domain = host.strip_prefix("www.").unwrap_or(host).to_lowercase();

        Ok(Self {
            url: parsed.as_str().trim_end_matches('/').to_string(),
            domain,
        })
    }

    pub fn insight_url(&self, slug: &str) -> String {
        format!("{}/insights/{}", self.url, slug)
    }

    /// Image used whenever an article has no usable cover.
    pub fn fallback_image(&self) -> String {
        format!("{}/avatar.svg", self.url)
    }

    /// Non-article pages listed in the sitemap.
    pub fn static_urls(&self) -> Vec<StaticUrl> {
        vec![
            StaticUrl {
                url: format!("{}/", self.url),
                priority: "1.0",
                changefreq: "weekly",
            },
            StaticUrl {
                url: format!("{}/insights", self.url),
                priority: "0.9",
                changefreq: "daily",
            },
        ]
    }
}

impl Default for Site {
    fn default() -> Self {
        Self {
            url: DEFAULT_SITE_URL.to_string(),
            domain: "kamilalipska.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticUrl {
    pub url: String,
    pub priority: &'static str,
    pub changefreq: &'static str,
}

/// Escapes `& < > " '` for embedding in XML or HTML.
pub fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
