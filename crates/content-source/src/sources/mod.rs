use async_trait::async_trait;

use crate::error::Result;
use crate::models::Article;

pub mod local;
pub mod notion;
pub mod wordpress;

#[cfg(test)]
mod test_server;

pub use local::LocalFileSource;
pub use notion::NotionSource;
pub use wordpress::WordPressSource;

/// A place articles can be pulled from.
///
/// Sources with nothing to offer (no credentials, an empty database, a
/// missing tag) return `Ok(vec![])`. Errors are reserved for failures the
/// caller may want to fall back from.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Short name used in logs and error messages
    fn name(&self) -> &'static str;

    /// Fetch normalized articles. Sources that page through a remote list
    /// stop once `limit` items are collected; others may ignore it.
    async fn fetch(&self, limit: usize) -> Result<Vec<Article>>;
}
