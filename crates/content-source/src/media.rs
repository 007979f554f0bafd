use url::Url;

pub const DEFAULT_EMOJI: &str = "📝";

/// Host of generated-image blobs whose signed links expire within hours.
const EXPIRING_IMAGE_HOST: &str = "oaidalleapiprodscus.blob.core.windows.net";

const EMOJI_GROUPS: [(&[&str], &str); 8] = [
    (&["ai", "artificial intelligence"], "🤖"),
    (&["web3", "crypto", "blockchain"], "🌐"),
    (&["saas", "product"], "🚀"),
    (&["growth", "marketing"], "📈"),
    (&["seo", "search"], "🔍"),
    (&["data", "analytics"], "📊"),
    (&["automation", "workflow"], "⚙️"),
    (&["profit", "revenue"], "💰"),
];

/// Picks the glyph shown in place of a missing cover image.
pub fn pick_emoji(title: &str, category: &str) -> &'static str {
    let text = format!("{} {}", title, category).to_lowercase();
    EMOJI_GROUPS
        .iter()
        .find(|(keys, _)| keys.iter().any(|key| text.contains(key)))
        .map(|(_, emoji)| *emoji)
        .unwrap_or(DEFAULT_EMOJI)
}

/// Returns `raw` as a normalized absolute http(s) URL, or `fallback` when it
/// is empty, relative, uses another scheme, or points at expiring storage.
pub fn normalize_image_url(raw: &str, fallback: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return fallback.to_string();
    }

    let Ok(url) = Url::parse(raw) else {
        return fallback.to_string();
    };

    if !matches!(url.scheme(), "http" | "https") {
        return fallback.to_string();
    }

    if url
        .host_str()
        .is_some_and(|host| host.contains(EXPIRING_IMAGE_HOST))
    {
        return fallback.to_string();
    }

    url.to_string()
}
