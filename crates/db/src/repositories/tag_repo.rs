//! Repository for the `tags` and `asset_tags` tables.

use segment3d_core::slug::base_slug;
use segment3d_core::types::DbId;
use sqlx::PgPool;

use crate::models::tag::Tag;

/// Column list for `tags` queries.
const COLUMNS: &str = "id, name, slug, created_at";

/// Default result count for keyword search.
pub const DEFAULT_SEARCH_LIMIT: i64 = 10;

/// Maximum result count for keyword search.
pub const MAX_SEARCH_LIMIT: i64 = 50;

/// Provides lookup and lazy creation of tags.
pub struct TagRepo;

impl TagRepo {
    /// Case-insensitive substring search on tag names, shortest names first.
    pub async fn search(
        pool: &PgPool,
        keyword: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Tag>, sqlx::Error> {
        let limit = limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);
        let query = format!(
            "SELECT {COLUMNS} FROM tags \
             WHERE name ILIKE '%' || $1 || '%' \
             ORDER BY length(name), name \
             LIMIT $2"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(escape_like(keyword))
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Resolve tag names to rows, creating the missing ones.
    ///
    /// Matching is exact and case-sensitive. Duplicate names in `names`
    /// resolve to a single row.
    pub async fn resolve_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        names: &[String],
    ) -> Result<Vec<Tag>, sqlx::Error> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        for name in names {
            sqlx::query(
                "INSERT INTO tags (id, name, slug) VALUES ($1, $2, $3) \
                 ON CONFLICT (name) DO NOTHING",
            )
            .bind(uuid::Uuid::now_v7())
            .bind(name)
            .bind(base_slug(name))
            .execute(&mut **tx)
            .await?;
        }

        let query = format!("SELECT {COLUMNS} FROM tags WHERE name = ANY($1) ORDER BY name");
        sqlx::query_as::<_, Tag>(&query)
            .bind(names)
            .fetch_all(&mut **tx)
            .await
    }

    /// Attach tags to an asset. Already-attached pairs are skipped.
    pub async fn attach_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        asset_id: DbId,
        tag_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        for tag_id in tag_ids {
            sqlx::query(
                "INSERT INTO asset_tags (asset_id, tag_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(asset_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE`.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("chair"), "chair");
    }
}
