//! Repository for the `assets` table.
//!
//! Read paths take `&PgPool`. Write paths that must commit together with tag,
//! like, or outbox rows take an open transaction.

use segment3d_core::asset_status::PipelineStage;
use segment3d_core::types::DbId;
use sqlx::PgPool;

use crate::models::asset::{Asset, AssetListing, NewAsset, StatusAdvance};
use crate::repositories::outbox_repo::OutboxRepo;
use crate::repositories::tag_repo::escape_like;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, title, slug, asset_type, thumbnail_url, photo_dir_url, \
                       pcl_url, pcl_colmap_url, splat_url, segmented_pcl_dir_url, \
                       segmented_splat_dir_url, is_private, status, likes, version, \
                       created_at, updated_at";

/// Same columns qualified with the `a` alias for joined queries.
const A_COLUMNS: &str = "a.id, a.user_id, a.title, a.slug, a.asset_type, a.thumbnail_url, \
                         a.photo_dir_url, a.pcl_url, a.pcl_colmap_url, a.splat_url, \
                         a.segmented_pcl_dir_url, a.segmented_splat_dir_url, a.is_private, \
                         a.status, a.likes, a.version, a.created_at, a.updated_at";

/// Public assets, plus the viewer's own. `$1` is the viewer (nullable).
const VISIBLE_TO_VIEWER: &str = "(a.is_private = false OR a.user_id = $1)";

/// Name of the unique constraint on `assets.slug`.
pub const SLUG_CONSTRAINT: &str = "uq_assets_slug";

/// Column that stores the output URL of a pipeline stage.
pub fn stage_output_column(stage: PipelineStage) -> &'static str {
    match stage {
        PipelineStage::SparsePointCloud => "pcl_colmap_url",
        PipelineStage::GaussianSplat => "splat_url",
        PipelineStage::Ptv3Segmentation => "segmented_pcl_dir_url",
        PipelineStage::SagaSegmentation => "segmented_splat_dir_url",
    }
}

/// Build a listing query. `$1` is always the viewer id (nullable) and `$2`
/// the optional title keyword; `condition` may reference further params.
fn listing_query(condition: &str) -> String {
    format!(
        "SELECT {A_COLUMNS}, \
                u.email AS owner_email, u.name AS owner_name, u.avatar AS owner_avatar, \
                COALESCE( \
                    array_agg(t.name ORDER BY t.name) FILTER (WHERE t.name IS NOT NULL), \
                    ARRAY[]::text[] \
                ) AS tag_names, \
                EXISTS ( \
                    SELECT 1 FROM likes l WHERE l.asset_id = a.id AND l.user_id = $1 \
                ) AS is_liked_by_me \
         FROM assets a \
         JOIN users u ON u.id = a.user_id \
         LEFT JOIN asset_tags at ON at.asset_id = a.id \
         LEFT JOIN tags t ON t.id = at.tag_id \
         WHERE {condition} \
           AND ($2::text IS NULL OR a.title ILIKE '%' || $2 || '%') \
         GROUP BY a.id, u.id \
         ORDER BY a.created_at DESC, a.id DESC"
    )
}

/// Normalize a free-text keyword into an escaped `LIKE` fragment.
fn keyword_param(keyword: Option<&str>) -> Option<String> {
    keyword
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(escape_like)
}

/// Provides queries and transactional writes for assets.
pub struct AssetRepo;

impl AssetRepo {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find an asset by ID regardless of visibility.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE id = $1");
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Every slug beginning with `base` (the base itself included).
    pub async fn slugs_with_prefix(pool: &PgPool, base: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT slug FROM assets WHERE slug LIKE $1 || '%'")
            .bind(escape_like(base))
            .fetch_all(pool)
            .await
    }

    /// Assets visible to `viewer` (anonymous when `None`), newest first.
    pub async fn list_visible(
        pool: &PgPool,
        viewer: Option<DbId>,
        keyword: Option<&str>,
    ) -> Result<Vec<AssetListing>, sqlx::Error> {
        let query = listing_query(VISIBLE_TO_VIEWER);
        sqlx::query_as::<_, AssetListing>(&query)
            .bind(viewer)
            .bind(keyword_param(keyword))
            .fetch_all(pool)
            .await
    }

    /// All assets owned by `owner`, private ones included, newest first.
    pub async fn list_owned(
        pool: &PgPool,
        owner: DbId,
        keyword: Option<&str>,
    ) -> Result<Vec<AssetListing>, sqlx::Error> {
        let query = listing_query("a.user_id = $1");
        sqlx::query_as::<_, AssetListing>(&query)
            .bind(owner)
            .bind(keyword_param(keyword))
            .fetch_all(pool)
            .await
    }

    /// Look up one asset by slug. Private assets of other users are
    /// reported as absent.
    pub async fn find_listing_by_slug(
        pool: &PgPool,
        slug: &str,
        viewer: Option<DbId>,
    ) -> Result<Option<AssetListing>, sqlx::Error> {
        let query = listing_query(&format!("a.slug = $3 AND {VISIBLE_TO_VIEWER}"));
        sqlx::query_as::<_, AssetListing>(&query)
            .bind(viewer)
            .bind(None::<String>)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Delete an asset owned by `owner`, returning the deleted row.
    ///
    /// Returns `None` both when the asset is missing and when someone else
    /// owns it.
    pub async fn delete_owned(
        pool: &PgPool,
        owner: DbId,
        id: DbId,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("DELETE FROM assets WHERE id = $1 AND user_id = $2 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new asset with status `created`.
    pub async fn insert_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &NewAsset,
    ) -> Result<Asset, sqlx::Error> {
        let query = format!(
            "INSERT INTO assets \
                (id, user_id, title, slug, asset_type, thumbnail_url, photo_dir_url, \
                 pcl_url, is_private, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'created') \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(input.id)
            .bind(input.user_id)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(input.asset_type.as_str())
            .bind(&input.thumbnail_url)
            .bind(&input.photo_dir_url)
            .bind(&input.pcl_url)
            .bind(input.is_private)
            .fetch_one(&mut **tx)
            .await
    }

    /// Lock an asset row for the rest of the transaction.
    pub async fn lock_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Lock an asset row only if `viewer` may see it.
    pub async fn lock_visible_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        viewer: DbId,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assets a WHERE a.id = $2 AND {VISIBLE_TO_VIEWER} FOR UPDATE"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(viewer)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Overwrite the output URL of `stage`. Status is untouched.
    pub async fn set_stage_output_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        stage: PipelineStage,
        url: &str,
    ) -> Result<Asset, sqlx::Error> {
        let column = stage_output_column(stage);
        let query = format!(
            "UPDATE assets SET {column} = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(url)
            .fetch_one(&mut **tx)
            .await
    }

    /// Move the status from `advance.from` to `advance.to` and enqueue the
    /// accompanying message.
    ///
    /// Returns `None` (and enqueues nothing) when the asset is no longer in
    /// `advance.from`.
    pub async fn advance_status_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        advance: &StatusAdvance,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!(
            "UPDATE assets SET status = $3, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(advance.from.as_str())
            .bind(advance.to.as_str())
            .fetch_optional(&mut **tx)
            .await?;

        if updated.is_some() {
            OutboxRepo::insert_in(tx, &advance.message).await?;
        }
        Ok(updated)
    }

    /// Add `delta` to the like counter, never going below zero.
    pub async fn adjust_likes_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        delta: i32,
    ) -> Result<Asset, sqlx::Error> {
        let query = format!(
            "UPDATE assets SET likes = GREATEST(likes + $2, 0) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .bind(delta)
            .fetch_one(&mut **tx)
            .await
    }
}
