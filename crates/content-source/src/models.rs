use serde::{Deserialize, Serialize};

/// Where an article came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The local posts file.
    Native,
    /// The Notion publishing database.
    Notion,
    /// A WordPress post whose canonical home is the external blog.
    Reference,
}

/// A normalized article, identical in shape whichever source produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub llms_description: String,
    pub category: String,
    pub category_slug: String,
    pub image: String,
    pub emoji: String,
    pub source_url: String,
    pub url: String,
    pub published_at: String,
    pub updated_at: String,
    pub source_kind: SourceKind,
    pub is_reference: bool,
}

impl Article {
    /// Articles without a slug or title are dropped by every adapter.
    pub fn is_complete(&self) -> bool {
        !self.slug.is_empty() && !self.title.is_empty()
    }
}
