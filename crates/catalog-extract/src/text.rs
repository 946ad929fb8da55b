use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static BARE_SKU_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{3,}$").expect("valid regex"));
static SKU_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-([A-Za-z0-9]{5,})$").expect("valid regex"));

/// Strip markup, decode the common entities and collapse whitespace.
pub fn plain_text(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    WS_RE.replace_all(decoded.trim(), " ").into_owned()
}

/// Truncate on a character boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].trim_end().to_string(),
        None => s.to_string(),
    }
}

/// A standalone SKU token such as `3MD10251043` or `61.98432`.
pub fn bare_sku(s: &str) -> Option<String> {
    let s = s.trim();
    (BARE_SKU_RE.is_match(s) && s.chars().any(|c| c.is_ascii_digit())).then(|| s.to_string())
}

/// The `-<SKU>` suffix of a URL slug or file stem, upper-cased.
pub fn sku_suffix(slug: &str) -> Option<String> {
    let slug = slug.trim_end_matches('/');
    let slug = slug.rsplit('/').next().unwrap_or(slug);
    let slug = slug.split(['?', '#']).next().unwrap_or(slug);
    let slug = slug.strip_suffix(".json").unwrap_or(slug);
    let caps = SKU_SUFFIX_RE.captures(slug)?;
    let sku = caps.get(1)?.as_str();
    sku.chars().any(|c| c.is_ascii_digit()).then(|| sku.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_strips_markup() {
        assert_eq!(
            plain_text("<p>Light &amp; fast</p>\n\n<ul><li>Trail</li></ul>"),
            "Light & fast Trail"
        );
    }

    #[test]
    fn truncates_multibyte_safely() {
        assert_eq!(truncate_chars("Zürich café", 6), "Zürich");
        assert_eq!(truncate_chars("short", 50), "short");
    }

    #[test]
    fn sku_suffix_from_urls_and_files() {
        assert_eq!(sku_suffix("https://on.com/en-us/products/cloud-6-3md10251043/"), Some("3MD10251043".into()));
        assert_eq!(sku_suffix("products-cloud-6-3MD10251043.json"), Some("3MD10251043".into()));
        assert_eq!(sku_suffix("https://on.com/shop/running-shoes"), None);
        assert_eq!(sku_suffix("https://on.com/x-3md?color=black"), None);
        assert_eq!(sku_suffix("https://on.com/x-3md1023?color=black"), Some("3MD1023".into()));
    }

    #[test]
    fn bare_sku_requires_digit() {
        assert_eq!(bare_sku(" 3MD10251043 "), Some("3MD10251043".into()));
        assert_eq!(bare_sku("Cloud"), None);
        assert_eq!(bare_sku("$140 · 3MD10"), None);
    }
}
