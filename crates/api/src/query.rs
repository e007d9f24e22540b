//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Filters accepted by the asset listing endpoints (`?keyword=&filter=`).
///
/// `filter` is a comma-separated list of tag names; an asset matches when any
/// of its tags is in the list.
#[derive(Debug, Default, Deserialize)]
pub struct AssetListParams {
    pub keyword: Option<String>,
    pub filter: Option<String>,
}

/// Query parameters for `GET /tags/search`.
#[derive(Debug, Deserialize)]
pub struct TagSearchParams {
    #[serde(default)]
    pub keyword: String,
    pub limit: Option<i64>,
}
