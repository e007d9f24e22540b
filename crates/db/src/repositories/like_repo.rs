//! Repository for the `likes` table and the asset like counter.

use segment3d_core::types::DbId;
use sqlx::PgPool;

use crate::models::asset::Asset;
use crate::repositories::asset_repo::AssetRepo;

/// Result of a like attempt.
#[derive(Debug, Clone)]
pub enum LikeOutcome {
    /// New like recorded; carries the asset with its incremented counter.
    Liked(Asset),
    /// The `(user, asset)` pair already existed; nothing changed.
    AlreadyLiked,
    /// No asset with that id is visible to the user.
    AssetMissing,
}

/// Result of an unlike attempt.
#[derive(Debug, Clone)]
pub enum UnlikeOutcome {
    /// Like removed; carries the asset with its decremented counter.
    Unliked(Asset),
    /// The user had not liked the asset (or it does not exist).
    NotLiked,
}

/// Like bookkeeping. Each call is its own transaction so the like row and
/// the counter always move together.
pub struct LikeRepo;

impl LikeRepo {
    /// Record a like. The `(user_id, asset_id)` primary key detects
    /// duplicates.
    pub async fn like(pool: &PgPool, user_id: DbId, asset_id: DbId) -> Result<LikeOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if AssetRepo::lock_visible_in(&mut tx, asset_id, user_id)
            .await?
            .is_none()
        {
            return Ok(LikeOutcome::AssetMissing);
        }

        let inserted = sqlx::query(
            "INSERT INTO likes (user_id, asset_id) VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_likes_user_asset DO NOTHING",
        )
        .bind(user_id)
        .bind(asset_id)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Ok(LikeOutcome::AlreadyLiked);
        }

        let asset = AssetRepo::adjust_likes_in(&mut tx, asset_id, 1).await?;
        tx.commit().await?;
        Ok(LikeOutcome::Liked(asset))
    }

    /// Remove a like and decrement the counter.
    ///
    /// Locks the asset row before touching `likes`, in the same order as
    /// [`LikeRepo::like`].
    pub async fn unlike(
        pool: &PgPool,
        user_id: DbId,
        asset_id: DbId,
    ) -> Result<UnlikeOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if AssetRepo::lock_in(&mut tx, asset_id).await?.is_none() {
            return Ok(UnlikeOutcome::NotLiked);
        }

        let removed = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND asset_id = $2")
            .bind(user_id)
            .bind(asset_id)
            .execute(&mut *tx)
            .await?;

        if removed.rows_affected() == 0 {
            return Ok(UnlikeOutcome::NotLiked);
        }

        let asset = AssetRepo::adjust_likes_in(&mut tx, asset_id, -1).await?;
        tx.commit().await?;
        Ok(UnlikeOutcome::Unliked(asset))
    }
}
