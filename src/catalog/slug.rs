//! URL slug helpers

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::book::SLUG_MAX_LEN;

/// Used when a title has nothing that survives transliteration
pub const FALLBACK_SLUG: &str = "book";

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern is valid"));

/// Slug accepted when supplied by a client: letters, digits, hyphens, underscores
pub fn is_valid_slug(value: &str) -> bool {
    value.len() <= SLUG_MAX_LEN && SLUG_RE.is_match(value)
}

/// Lowercase, ASCII-transliterated, hyphen-separated slug for `title`.
pub fn derive_slug(title: &str) -> String {
    let slug = clip(&::slug::slugify(title), SLUG_MAX_LEN);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// `base` with a `-n` suffix, clipped so the result stays within the limit.
pub fn with_suffix(base: &str, n: u32) -> String {
    let suffix = format!("-{}", n);
    let room = SLUG_MAX_LEN.saturating_sub(suffix.len());
    format!("{}{}", clip(base, room), suffix)
}

// Derived slugs are ASCII, so byte offsets are char boundaries.
fn clip(slug: &str, max: usize) -> String {
    let end = slug
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|&end| end <= max)
        .last()
        .unwrap_or(0);
    slug[..end].trim_end_matches('-').to_string()
}
