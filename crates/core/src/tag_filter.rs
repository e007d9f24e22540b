//! Comma-separated tag filter used by the asset listings.

/// Parse a `filter` query value into tag names.
///
/// Empty segments are dropped and names are trimmed; matching is exact and
/// case-sensitive, the same as tag resolution on create.
pub fn parse_filter(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// An empty filter keeps everything; otherwise at least one of the asset's
/// tags must appear in the filter.
pub fn matches_any(asset_tags: &[String], filter: &[String]) -> bool {
    filter.is_empty() || asset_tags.iter().any(|tag| filter.contains(tag))
}
