//! Integration tests for the asset, tag, like, and outbox repositories.
//!
//! Exercises visibility rules, slug prefix lookup, tag resolution, the like
//! counter, and guarded status advances against a real database.

use segment3d_core::asset_status::{AssetStatus, PipelineStage};
use segment3d_core::asset_type::AssetType;
use segment3d_core::auth_provider::AuthProvider;
use segment3d_core::types::DbId;
use segment3d_db::models::asset::{Asset, NewAsset, StatusAdvance};
use segment3d_db::models::outbox::NewOutboxMessage;
use segment3d_db::models::user::{CreateUser, User};
use segment3d_db::repositories::{
    AssetRepo, LikeOutcome, LikeRepo, OutboxRepo, TagRepo, UnlikeOutcome, UserRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, email: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            name: email.split('@').next().unwrap_or("user").to_string(),
            avatar: String::new(),
            password_hash: Some("$argon2id$placeholder".to_string()),
            provider: AuthProvider::Credentials,
        },
    )
    .await
    .expect("user creation should succeed")
}

async fn new_asset(
    pool: &PgPool,
    owner: DbId,
    slug: &str,
    is_private: bool,
    tags: &[&str],
) -> Asset {
    let mut tx = pool.begin().await.unwrap();
    let asset = AssetRepo::insert_in(
        &mut tx,
        &NewAsset {
            id: uuid::Uuid::now_v7(),
            user_id: owner,
            title: slug.replace('-', " "),
            slug: slug.to_string(),
            asset_type: AssetType::NonLidar,
            thumbnail_url: "/thumbnail/x.png".to_string(),
            photo_dir_url: "/files/x".to_string(),
            pcl_url: None,
            is_private,
        },
    )
    .await
    .expect("asset insert should succeed");

    let names: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
    let resolved = TagRepo::resolve_in(&mut tx, &names).await.unwrap();
    let ids: Vec<DbId> = resolved.iter().map(|t| t.id).collect();
    TagRepo::attach_in(&mut tx, asset.id, &ids).await.unwrap();
    tx.commit().await.unwrap();
    asset
}

async fn like_rows(pool: &PgPool, user_id: DbId, asset_id: DbId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE user_id = $1 AND asset_id = $2")
        .bind(user_id)
        .bind(asset_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn status_message(asset_id: DbId) -> NewOutboxMessage {
    NewOutboxMessage {
        queue: "asset_status".to_string(),
        asset_id: Some(asset_id),
        payload: serde_json::json!({ "asset_id": asset_id }),
    }
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_anonymous_listing_hides_private_assets(pool: PgPool) {
    let owner = new_user(&pool, "owner@test.com").await;
    new_asset(&pool, owner.id, "public-scan", false, &[]).await;
    new_asset(&pool, owner.id, "secret-scan", true, &[]).await;

    let listed = AssetRepo::list_visible(&pool, None, None).await.unwrap();
    let slugs: Vec<_> = listed.iter().map(|l| l.asset.slug.as_str()).collect();
    assert_eq!(slugs, ["public-scan"]);
    assert!(!listed[0].is_liked_by_me);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_owner_sees_own_private_assets_newest_first(pool: PgPool) {
    let owner = new_user(&pool, "owner@test.com").await;
    let other = new_user(&pool, "other@test.com").await;
    new_asset(&pool, owner.id, "first", false, &[]).await;
    new_asset(&pool, owner.id, "second", true, &[]).await;
    new_asset(&pool, other.id, "others-secret", true, &[]).await;

    let listed = AssetRepo::list_visible(&pool, Some(owner.id), None).await.unwrap();
    let slugs: Vec<_> = listed.iter().map(|l| l.asset.slug.as_str()).collect();
    assert_eq!(slugs, ["second", "first"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_keyword_is_case_insensitive_substring(pool: PgPool) {
    let owner = new_user(&pool, "owner@test.com").await;
    new_asset(&pool, owner.id, "living-room", false, &[]).await;
    new_asset(&pool, owner.id, "garden", false, &[]).await;

    let listed = AssetRepo::list_visible(&pool, None, Some("ROOM")).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].asset.slug, "living-room");

    let none = AssetRepo::list_visible(&pool, None, Some("100%")).await.unwrap();
    assert!(none.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_slug_lookup_hides_other_users_private_assets(pool: PgPool) {
    let owner = new_user(&pool, "owner@test.com").await;
    let other = new_user(&pool, "other@test.com").await;
    new_asset(&pool, owner.id, "hidden", true, &[]).await;

    let as_other = AssetRepo::find_listing_by_slug(&pool, "hidden", Some(other.id))
        .await
        .unwrap();
    assert!(as_other.is_none());

    let as_owner = AssetRepo::find_listing_by_slug(&pool, "hidden", Some(owner.id))
        .await
        .unwrap()
        .expect("owner should see their asset");
    assert_eq!(as_owner.owner_email, "owner@test.com");
}

// ---------------------------------------------------------------------------
// Slugs and tags
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_slug_prefix_lookup_escapes_wildcards(pool: PgPool) {
    let owner = new_user(&pool, "owner@test.com").await;
    new_asset(&pool, owner.id, "my-scan", false, &[]).await;
    new_asset(&pool, owner.id, "my-scan-2", false, &[]).await;
    new_asset(&pool, owner.id, "myxscan", false, &[]).await;

    let mut slugs = AssetRepo::slugs_with_prefix(&pool, "my-scan").await.unwrap();
    slugs.sort();
    assert_eq!(slugs, ["my-scan", "my-scan-2"]);

    let underscore = AssetRepo::slugs_with_prefix(&pool, "my_scan").await.unwrap();
    assert!(underscore.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tags_are_created_once_and_listed_with_assets(pool: PgPool) {
    let owner = new_user(&pool, "owner@test.com").await;
    new_asset(&pool, owner.id, "a", false, &["indoor", "chair"]).await;
    new_asset(&pool, owner.id, "b", false, &["indoor", "Indoor"]).await;

    let found = TagRepo::search(&pool, "indoor", None).await.unwrap();
    let names: Vec<_> = found.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names.len(), 2, "case-sensitive names are distinct tags");

    let listed = AssetRepo::list_visible(&pool, None, None).await.unwrap();
    let a = listed.iter().find(|l| l.asset.slug == "a").unwrap();
    assert_eq!(a.tag_names, ["chair", "indoor"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tag_search_respects_limit(pool: PgPool) {
    let owner = new_user(&pool, "owner@test.com").await;
    new_asset(&pool, owner.id, "a", false, &["scan-1", "scan-2", "scan-3"]).await;

    let found = TagRepo::search(&pool, "scan", Some(2)).await.unwrap();
    assert_eq!(found.len(), 2);
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_like_twice_counts_once(pool: PgPool) {
    let owner = new_user(&pool, "owner@test.com").await;
    let fan = new_user(&pool, "fan@test.com").await;
    let asset = new_asset(&pool, owner.id, "liked", false, &[]).await;

    let first = LikeRepo::like(&pool, fan.id, asset.id).await.unwrap();
    assert!(matches!(first, LikeOutcome::Liked(ref a) if a.likes == 1));

    let second = LikeRepo::like(&pool, fan.id, asset.id).await.unwrap();
    assert!(matches!(second, LikeOutcome::AlreadyLiked));

    let reloaded = AssetRepo::find_by_id(&pool, asset.id).await.unwrap().unwrap();
    assert_eq!(reloaded.likes, 1);
    assert_eq!(like_rows(&pool, fan.id, asset.id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_liking_someone_elses_private_asset_reports_missing(pool: PgPool) {
    let owner = new_user(&pool, "owner@test.com").await;
    let fan = new_user(&pool, "fan@test.com").await;
    let asset = new_asset(&pool, owner.id, "private", true, &[]).await;

    let outcome = LikeRepo::like(&pool, fan.id, asset.id).await.unwrap();
    assert!(matches!(outcome, LikeOutcome::AssetMissing));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unlike_without_like_leaves_counter(pool: PgPool) {
    let owner = new_user(&pool, "owner@test.com").await;
    let fan = new_user(&pool, "fan@test.com").await;
    let asset = new_asset(&pool, owner.id, "unliked", false, &[]).await;

    let outcome = LikeRepo::unlike(&pool, fan.id, asset.id).await.unwrap();
    assert!(matches!(outcome, UnlikeOutcome::NotLiked));

    LikeRepo::like(&pool, fan.id, asset.id).await.unwrap();
    let outcome = LikeRepo::unlike(&pool, fan.id, asset.id).await.unwrap();
    assert!(matches!(outcome, UnlikeOutcome::Unliked(ref a) if a.likes == 0));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_like_and_unlike_never_deadlock(pool: PgPool) {
    let owner = new_user(&pool, "owner@test.com").await;
    let fan = new_user(&pool, "fan@test.com").await;
    let asset = new_asset(&pool, owner.id, "contested", false, &[]).await;

    for round in 0..100 {
        let (liked, unliked) = tokio::join!(
            LikeRepo::like(&pool, fan.id, asset.id),
            LikeRepo::unlike(&pool, fan.id, asset.id),
        );
        liked.unwrap_or_else(|e| panic!("like failed in round {round}: {e}"));
        unliked.unwrap_or_else(|e| panic!("unlike failed in round {round}: {e}"));

        let reloaded = AssetRepo::find_by_id(&pool, asset.id).await.unwrap().unwrap();
        assert_eq!(
            i64::from(reloaded.likes),
            like_rows(&pool, fan.id, asset.id).await,
            "counter drifted from like rows in round {round}"
        );
    }
}

// ---------------------------------------------------------------------------
// Deletes and status
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_requires_ownership(pool: PgPool) {
    let owner = new_user(&pool, "owner@test.com").await;
    let other = new_user(&pool, "other@test.com").await;
    let asset = new_asset(&pool, owner.id, "keep-me", false, &[]).await;

    let denied = AssetRepo::delete_owned(&pool, other.id, asset.id).await.unwrap();
    assert!(denied.is_none());
    assert!(AssetRepo::find_by_id(&pool, asset.id).await.unwrap().is_some());

    let deleted = AssetRepo::delete_owned(&pool, owner.id, asset.id).await.unwrap();
    assert_eq!(deleted.map(|a| a.id), Some(asset.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_guarded_advance_enqueues_only_when_status_matches(pool: PgPool) {
    let owner = new_user(&pool, "owner@test.com").await;
    let asset = new_asset(&pool, owner.id, "staged", false, &[]).await;

    let advance = StatusAdvance {
        from: AssetStatus::Created,
        to: AssetStatus::GeneratingSparsePointCloud,
        message: status_message(asset.id),
    };

    let mut tx = pool.begin().await.unwrap();
    let moved = AssetRepo::advance_status_in(&mut tx, asset.id, &advance)
        .await
        .unwrap()
        .expect("first advance applies");
    assert_eq!(moved.status, AssetStatus::GeneratingSparsePointCloud);
    assert_eq!(moved.version, asset.version + 1);

    let replay = AssetRepo::advance_status_in(&mut tx, asset.id, &advance).await.unwrap();
    assert!(replay.is_none());
    tx.commit().await.unwrap();

    let pending = OutboxRepo::fetch_pending(&pool, 10).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].asset_id, Some(asset.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stage_output_write_keeps_status(pool: PgPool) {
    let owner = new_user(&pool, "owner@test.com").await;
    let asset = new_asset(&pool, owner.id, "splat", false, &[]).await;

    let mut tx = pool.begin().await.unwrap();
    let updated = AssetRepo::set_stage_output_in(
        &mut tx,
        asset.id,
        PipelineStage::GaussianSplat,
        "/files/x/splat.ply",
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(updated.splat_url.as_deref(), Some("/files/x/splat.ply"));
    assert_eq!(updated.status, AssetStatus::Created);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_outbox_publish_bookkeeping(pool: PgPool) {
    let id = OutboxRepo::insert(
        &pool,
        &NewOutboxMessage {
            queue: "process".to_string(),
            asset_id: None,
            payload: serde_json::json!({}),
        },
    )
    .await
    .unwrap();

    assert_eq!(OutboxRepo::pending_count(&pool).await.unwrap(), 1);
    OutboxRepo::record_failure(&pool, id, "broker down").await.unwrap();
    let pending = OutboxRepo::fetch_pending(&pool, 10).await.unwrap();
    assert_eq!(pending[0].attempts, 1);
    assert_eq!(pending[0].last_error.as_deref(), Some("broker down"));

    assert!(OutboxRepo::mark_published(&pool, id).await.unwrap());
    assert!(!OutboxRepo::mark_published(&pool, id).await.unwrap());
    assert!(OutboxRepo::fetch_pending(&pool, 10).await.unwrap().is_empty());
    assert_eq!(OutboxRepo::pending_count(&pool).await.unwrap(), 0);
}
