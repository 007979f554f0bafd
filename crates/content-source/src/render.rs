//! Text outputs built from the merged feed: the XML sitemap and the
//! LLM-discovery listing.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use crate::aggregator::published_timestamp;
use crate::models::Article;
use crate::site::{xml_escape, Site, StaticUrl};

fn lastmod(article: &Article, now: DateTime<Utc>) -> String {
    let millis = [&article.updated_at, &article.published_at]
        .into_iter()
        .map(|value| published_timestamp(value))
        .find(|millis| *millis != 0);

    millis
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        .unwrap_or(now)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn sitemap(static_urls: &[StaticUrl], articles: &[Article], now: DateTime<Utc>) -> String {
    let generated = now.to_rfc3339_opts(SecondsFormat::Millis, true);

    let mut entries: Vec<(String, String, &str, &str)> = static_urls
        .iter()
        .map(|entry| (entry.url.clone(), generated.clone(), entry.changefreq, entry.priority))
        .collect();
    entries.extend(
        articles
            .iter()
            .map(|article| (article.url.clone(), lastmod(article, now), "weekly", "0.8")),
    );

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    for (loc, modified, changefreq, priority) in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", xml_escape(&loc)));
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", xml_escape(&modified)));
        xml.push_str(&format!("    <changefreq>{}</changefreq>\n", changefreq));
        xml.push_str(&format!("    <priority>{}</priority>\n", priority));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

pub fn llms_txt(site: &Site, articles: &[Article]) -> String {
    let mut out = String::new();
    out.push_str("# Kamila Lipska - LLM Knowledge File\n\n");
    out.push_str("This file lists published portfolio insights with concise descriptions for AI systems.\n");
    out.push_str(&format!("Website: {}\n\n", site.url));
    out.push_str("## Insights\n");

    let lines: Vec<String> = articles
        .iter()
        .map(|article| {
            let description = if article.llms_description.trim().is_empty() {
                &article.excerpt
            } else {
                &article.llms_description
            };
            let description = description.split_whitespace().collect::<Vec<_>>().join(" ");
            format!(
                "- {} | {} | {} | {}",
                article.title, article.url, article.category, description
            )
        })
        .collect();
    out.push_str(&lines.join("\n"));
    out.push('\n');

    out
}
