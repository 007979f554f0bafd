use anyhow::Result;
use std::env;
use std::path::PathBuf;

use crate::site::{Site, DEFAULT_SITE_URL};

pub const DEFAULT_POSTS_PATH: &str = "insights/posts.json";
pub const DEFAULT_WORDPRESS_API_BASE: &str = "https://crypto-mum.com/wp-json/wp/v2";
pub const DEFAULT_WORDPRESS_TAG_SLUG: &str = "growth-architect";

/// Credentials for the Notion publishing database. Both are required.
#[derive(Debug, Clone)]
pub struct NotionCredentials {
    pub api_key: String,
    pub database_id: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub site: Site,
    pub posts_path: PathBuf,
    /// `None` when either credential is missing; the Notion source is then
    /// skipped rather than failing.
    pub notion: Option<NotionCredentials>,
    pub wordpress_api_base: String,
    pub wordpress_tag_slug: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        let site_url = non_empty_var("SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
        let site = Site::parse(&site_url)?;

        let posts_path = non_empty_var("INSIGHTS_POSTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_POSTS_PATH));

        let notion = match (non_empty_var("NOTION_API_KEY"), non_empty_var("NOTION_DATABASE_ID")) {
            (Some(api_key), Some(database_id)) => Some(NotionCredentials {
                api_key,
                database_id,
            }),
            _ => None,
        };

        let wordpress_api_base = non_empty_var("WORDPRESS_API_BASE")
            .unwrap_or_else(|| DEFAULT_WORDPRESS_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let wordpress_tag_slug = non_empty_var("WORDPRESS_TAG_SLUG")
            .unwrap_or_else(|| DEFAULT_WORDPRESS_TAG_SLUG.to_string());

        Ok(Self {
            site,
            posts_path,
            notion,
            wordpress_api_base,
            wordpress_tag_slug,
        })
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/kamila-insights/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("kamila-insights").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: Site::default(),
            posts_path: PathBuf::from(DEFAULT_POSTS_PATH),
            notion: None,
            wordpress_api_base: DEFAULT_WORDPRESS_API_BASE.to_string(),
            wordpress_tag_slug: DEFAULT_WORDPRESS_TAG_SLUG.to_string(),
        }
    }
}

/// Blank values count as unset.
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
