//! Slug derivation for asset and tag names.

/// Used when a title contains no ASCII letters or digits at all.
pub const FALLBACK_SLUG: &str = "asset";

/// Derive the base slug for a title.
///
/// Lowercases, drops everything that is not an ASCII letter, digit, or
/// whitespace, then joins the remaining words with single hyphens.
pub fn base_slug(title: &str) -> String {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    let slug = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Pick a free slug given every existing slug that starts with `base`.
///
/// With no existing matches the base itself is used. Otherwise the suffix is
/// `count + 1`, bumped further if that exact slug is already taken (a longer
/// title such as `my-scanner` also shares the `my-scan` prefix).
pub fn next_slug(base: &str, existing: &[String]) -> String {
    if existing.is_empty() {
        return base.to_string();
    }

    let mut n = existing.len() + 1;
    loop {
        let candidate = format!("{base}-{n}");
        if !existing.iter().any(|s| s == &candidate) {
            return candidate;
        }
        n += 1;
    }
}
