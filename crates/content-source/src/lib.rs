// Public modules
pub mod aggregator;
pub mod category;
pub mod config;
pub mod error;
pub mod media;
pub mod models;
pub mod render;
pub mod site;
pub mod sources;
pub mod text;

/// Longest excerpt, in characters, before it is cut and ellipsized.
pub const EXCERPT_MAX_CHARS: usize = 220;

// Re-export commonly used types
pub use aggregator::{merge_prefer_first, sort_newest_first, Aggregator, DEFAULT_LIMIT};
pub use category::{normalize_category, Category};
pub use config::Config;
pub use error::{Result, SourceError};
pub use media::{normalize_image_url, pick_emoji};
pub use models::{Article, SourceKind};
pub use site::{xml_escape, Site, StaticUrl};
pub use sources::{ArticleSource, LocalFileSource, NotionSource, WordPressSource};
pub use text::{strip_html, to_slug};
