use serde::{Deserialize, Serialize};

use crate::text::to_slug;

/// The six buckets every article is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    AiAutomation,
    SeoContent,
    DataAttribution,
    Web3Growth,
    SaasGrowth,
    GrowthStrategy,
}

impl Category {
    /// Matching order. The first category with a keyword contained in the
    /// raw label wins.
    pub const ALL: [Category; 6] = [
        Category::AiAutomation,
        Category::SeoContent,
        Category::DataAttribution,
        Category::Web3Growth,
        Category::SaasGrowth,
        Category::GrowthStrategy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::AiAutomation => "AI & Automation",
            Category::SeoContent => "SEO & Content",
            Category::DataAttribution => "Data & Attribution",
            Category::Web3Growth => "Web3 Growth",
            Category::SaasGrowth => "SaaS Growth",
            Category::GrowthStrategy => "Growth Strategy",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::AiAutomation => &["ai", "automation", "agent", "llm"],
            Category::SeoContent => &["seo", "search", "content", "serp"],
            Category::DataAttribution => &["analytics", "data", "attribution", "tracking"],
            Category::Web3Growth => &["web3", "crypto", "blockchain", "token"],
            Category::SaasGrowth => &["saas", "b2b", "product-led", "product"],
            Category::GrowthStrategy => &["growth", "gtm", "marketing", "strategy"],
        }
    }

    pub fn slug(&self) -> String {
        to_slug(self.label())
    }

    /// Classifies a free-text label. Empty or unmatched labels fall back to
    /// Growth Strategy.
    pub fn classify(raw: &str) -> Category {
        let value = raw.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.keywords().iter().any(|key| value.contains(key)))
            .unwrap_or(Category::GrowthStrategy)
    }
}

/// Maps a raw source label onto one of the canonical category labels.
pub fn normalize_category(raw: &str) -> &'static str {
    Category::classify(raw).label()
}
